use super::{json_pretty, EXIT_SUCCESS};
use drvpack_core::DrvpackConfig;
use drvpack_rules::Classifier;

pub fn run(config: &DrvpackConfig, json: bool) -> Result<u8, String> {
    let classifier = Classifier::load(
        config.rules.categories.as_deref(),
        config.rules.overrides.as_deref(),
    )
    .map_err(|e| format!("rule error: {e}"))?;

    if json {
        let categories: Vec<serde_json::Value> = classifier
            .categories()
            .iter()
            .map(|rule| {
                serde_json::json!({
                    "name": rule.name,
                    "matches": rule.predicate.is_some(),
                    "dependencies": rule.children,
                })
            })
            .collect();
        let payload = serde_json::json!({
            "categories": categories,
            "overrides": classifier.overrides().len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for rule in classifier.categories().iter() {
            let kind = if rule.predicate.is_some() { "rule" } else { "group" };
            if rule.children.is_empty() {
                println!("{} ({kind})", rule.name);
            } else {
                let deps: Vec<String> = rule.children.iter().map(ToString::to_string).collect();
                println!("{} ({kind}) <- {}", rule.name, deps.join(", "));
            }
        }
        println!(
            "{} categories, {} override rules",
            classifier.categories().len(),
            classifier.overrides().len()
        );
    }
    Ok(EXIT_SUCCESS)
}
