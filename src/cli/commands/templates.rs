//! Templates command - list instruction templates.

use crate::cli::output::preview_line;
use crate::cli::Output;
use crate::compose::{Composer, TemplateKey};
use crate::config::{Prompts, Settings};
use anyhow::Result;
use console::style;

/// One row of the template listing.
pub(crate) fn template_rows(composer: &Composer) -> Vec<(TemplateKey, String)> {
    TemplateKey::ALL
        .iter()
        .map(|key| {
            let phrase = composer
                .phrase(*key, None)
                .unwrap_or_else(|_| "(your own instruction, via --custom-prompt)".to_string());
            (*key, phrase)
        })
        .collect()
}

/// Run the templates command.
pub fn run_templates(settings: &Settings) -> Result<()> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let composer = Composer::new(prompts, settings.prompts.length_hint);

    Output::header("Templates");
    println!();
    for (key, phrase) in template_rows(&composer) {
        println!("  {:<22} {}", style(key.label()).bold(), preview_line(&phrase, 70));
    }
    println!();
    println!(
        "  {}",
        style("Pass a label to --template, e.g. --template \"key points\" or --template tl-dr").dim()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cover_every_template() {
        let rows = template_rows(&Composer::default());
        assert_eq!(rows.len(), TemplateKey::ALL.len());
        assert_eq!(rows[0].1, "Summarize the following content:");
        assert!(rows.last().unwrap().1.contains("--custom-prompt"));
    }
}
