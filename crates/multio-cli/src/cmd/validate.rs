use super::Loaded;
use crate::output::{issue_line, print_json};
use std::path::Path;

pub fn run(path: &Path, collection: bool, strict: bool, json: bool) -> anyhow::Result<()> {
    let doc = Loaded::read(path, collection)?;
    let issues = doc.validate();

    if json {
        let value = serde_json::json!({
            "file": path,
            "issues": issues,
        });
        print_json(&value)?;
    } else if issues.is_empty() {
        println!("{}: valid", path.display());
    } else {
        for issue in &issues {
            println!("{}", issue_line(issue));
        }
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    let warnings = issues.len() - errors;
    if errors > 0 {
        anyhow::bail!("validation found {errors} error(s)");
    }
    if strict && warnings > 0 {
        anyhow::bail!("validation found {warnings} warning(s) in strict mode");
    }
    Ok(())
}
