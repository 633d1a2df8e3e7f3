use super::Loaded;
use multio_plans::Format;
use std::path::Path;

pub fn run(
    path: &Path,
    to: Format,
    output: Option<&Path>,
    collection: bool,
    ensure_sink: bool,
) -> anyhow::Result<()> {
    let mut doc = Loaded::read(path, collection)?;
    if ensure_sink {
        doc.ensure_sinks()?;
    }

    match output {
        Some(out) => {
            doc.write(out, to)?;
            tracing::info!(from = %path.display(), to = %out.display(), %to, "converted");
        }
        None => print!("{}", ensure_newline(doc.dump(to)?)),
    }
    Ok(())
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
