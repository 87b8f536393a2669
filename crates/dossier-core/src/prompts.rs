//! Prompt Builder
//!
//! Fixed templates for both pipeline stages. Section names and their order
//! are part of the output contract with the provider and are not configurable.

/// Section headings the report stage must produce, in order
pub const REPORT_SECTIONS: [&str; 2] = ["## Description", "## Key Offerings"];

/// Section headings the analysis stage must produce, in order
pub const ANALYSIS_SECTIONS: [&str; 4] = ["## Summary", "## Strengths", "## Risks", "## Outlook"];

const ANALYSIS_INPUT_START: &str = "<<<REPORT";
const ANALYSIS_INPUT_END: &str = "REPORT>>>";

/// Build the stage-1 prompt for a company (or other subject).
///
/// The subject is embedded verbatim.
pub fn build_report_prompt(subject: &str) -> String {
    format!(
        r#"Draft a comprehensive Markdown summary for the company named '{subject}'. The summary must be generated after performing a search on the company to gather up-to-date information. Format the output strictly as follows:

1.  Use the company name as the main heading (#).
2.  Include a subheading 'Description' (## Description) with a concise overview of what the company does, its sector, and global standing.
3.  Finally, include a subheading 'Key Offerings' (## Key Offerings) with a bulleted list of 3-5 of their main services, products, or business segments.

Respond with the Markdown document only. Do not add any commentary before or after it.

**Example of the desired output format:**

# [Example Company Name]
## Description
[Example Company] is a multinational corporation specializing in [Industry/Sector]. It is known globally for [Key characteristic] and operates in [Number] countries. Its primary focus is on [Main Business Area].

## Key Offerings
* [Main Product/Service 1]
* [Main Product/Service 2]
* [Main Product/Service 3]
* [Main Product/Service 4]
"#
    )
}

/// Build the stage-2 prompt from the full stage-1 content.
pub fn build_analysis_prompt(prior_content: &str) -> String {
    format!(
        r#"Analyze the company report delimited by {ANALYSIS_INPUT_START} and {ANALYSIS_INPUT_END} below. Format the output strictly as follows:

1.  Use '# Analysis' as the main heading.
2.  Include a subheading 'Summary' (## Summary) with a single paragraph condensing the report.
3.  Include a subheading 'Strengths' (## Strengths) with a bulleted list of 3-5 competitive strengths.
4.  Include a subheading 'Risks' (## Risks) with a bulleted list of 3-5 risks or weaknesses.
5.  Finally, include a subheading 'Outlook' (## Outlook) with a single paragraph on the company's prospects.

Base the analysis only on the report. Respond with the Markdown document only. Do not add any commentary before or after it.

{ANALYSIS_INPUT_START}
{prior_content}
{ANALYSIS_INPUT_END}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn positions(haystack: &str, needles: &[&str]) -> Vec<usize> {
        needles
            .iter()
            .map(|n| haystack.find(n).unwrap_or(usize::MAX))
            .collect()
    }

    #[test]
    fn test_report_prompt_contract() {
        let prompt = build_report_prompt("Acme");
        assert!(prompt.contains("company named 'Acme'"));
        assert!(prompt.contains("3-5"));
        assert!(prompt.contains("Markdown document only"));

        let found = positions(&prompt, &REPORT_SECTIONS);
        assert!(found.iter().all(|&p| p != usize::MAX));
        assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_analysis_prompt_contract() {
        let report = "# Acme\n## Description\nAcme makes anvils.";
        let prompt = build_analysis_prompt(report);

        assert!(prompt.contains(&format!("{ANALYSIS_INPUT_START}\n{report}\n{ANALYSIS_INPUT_END}")));
        assert!(prompt.contains("# Analysis"));

        let found = positions(&prompt, &ANALYSIS_SECTIONS);
        assert!(found.iter().all(|&p| p != usize::MAX));
        assert!(found.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        assert_eq!(build_report_prompt("Acme"), build_report_prompt("Acme"));
        assert_eq!(build_analysis_prompt("x"), build_analysis_prompt("x"));
    }

    proptest! {
        #[test]
        fn prop_report_prompt_contains_subject(subject in "(?s).{1,120}") {
            prop_assert!(build_report_prompt(&subject).contains(&subject));
        }

        #[test]
        fn prop_analysis_prompt_contains_content(content in "(?s).{1,400}") {
            prop_assert!(build_analysis_prompt(&content).contains(&content));
        }
    }
}
