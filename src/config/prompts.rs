//! Prompt templates for Trellis.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub docs: DocsPrompts,
    pub browser: BrowserPrompts,
    /// Prompts for LLM judge evaluators.
    pub judge: JudgePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the documentation agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsPrompts {
    pub system: String,
}

impl Default for DocsPrompts {
    fn default() -> Self {
        Self {
            system: r#"You're an all-knowing expert in the PydanticAI agent framework.
You will receive questions from users of PydanticAI about how to use the framework effectively.

Where necessary, use Tavily to search for PydanticAI information. The documentation can be found here: https://ai.pydantic.dev/
The LLM txt can be found here: https://ai.pydantic.dev/llms.txt

For any given answer, where possible provide references to the documentation or other relevant resources.
Give a confidence percentage for your answer, from 0 to 100."#
                .to_string(),
        }
    }
}

/// Prompts for the browser automation agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserPrompts {
    pub system: String,
}

impl Default for BrowserPrompts {
    fn default() -> Self {
        Self {
            system: r#"You're a helpful AI assistant with access to browser automation capabilities through Playwright.
You can navigate to websites, interact with web pages, take screenshots, and extract information.

When working with web pages:
- Be thorough in your web navigation and information extraction
- Take screenshots when helpful for verification
- Extract relevant information clearly and accurately
- Explain what you're doing with the browser
- Be mindful of website terms of service and respectful browsing practices

Give a confidence percentage for your answer, from 0 to 100.
List any websites you accessed in the websites_accessed field."#
                .to_string(),
        }
    }
}

/// Prompts for grading agent output against a rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgePrompts {
    pub system: String,
    pub user: String,
}

impl Default for JudgePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are grading the output of an AI assistant against a rubric.

Read the rubric carefully, then judge whether the output satisfies it.
Respond with a JSON object containing:
- "reason": a short explanation of your judgement
- "pass": true if the output satisfies the rubric, false otherwise
- "score": a number from 0.0 to 1.0 describing how well the rubric is met"#
                .to_string(),

            user: r#"Rubric:
{{rubric}}

{{input_section}}Output:
{{output}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let docs_path = custom_path.join("docs.toml");
            if docs_path.exists() {
                let content = std::fs::read_to_string(&docs_path)?;
                prompts.docs = toml::from_str(&content)?;
            }

            let browser_path = custom_path.join("browser.toml");
            if browser_path.exists() {
                let content = std::fs::read_to_string(&browser_path)?;
                prompts.browser = toml::from_str(&content)?;
            }

            let judge_path = custom_path.join("judge.toml");
            if judge_path.exists() {
                let content = std::fs::read_to_string(&judge_path)?;
                prompts.judge = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Load prompts as configured in settings.
    pub fn from_settings(settings: &crate::config::Settings) -> crate::error::Result<Self> {
        Self::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single pass, so substituted values are
    /// never rendered again. Unknown placeholders are left as written.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.docs.system.contains("PydanticAI"));
        assert!(prompts.browser.system.contains("websites_accessed"));
        assert!(prompts.judge.user.contains("{{rubric}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Rubric: {{rubric}} / {{rubric}}";
        let mut vars = HashMap::new();
        vars.insert("rubric".to_string(), "be clear".to_string());

        assert_eq!(Prompts::render(template, &vars), "Rubric: be clear / be clear");
    }

    #[test]
    fn test_render_does_not_expand_values() {
        let template = "{{input_section}}Output: {{output}}\nRubric: {{rubric}} {{unknown}} {{open";
        let mut vars = HashMap::new();
        vars.insert("rubric".to_string(), "be clear".to_string());
        vars.insert("input_section".to_string(), String::new());
        vars.insert(
            "output".to_string(),
            "use {{rubric}} and {{input_section}}".to_string(),
        );

        for _ in 0..10 {
            assert_eq!(
                Prompts::render(template, &vars),
                "Output: use {{rubric}} and {{input_section}}\nRubric: be clear {{unknown}} {{open"
            );
        }
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("project".to_string(), "trellis".to_string());
        prompts.variables.insert("audience".to_string(), "devs".to_string());

        let mut vars = HashMap::new();
        vars.insert("audience".to_string(), "users".to_string());

        let rendered = prompts.render_with_custom("{{project}} for {{audience}}", &vars);
        assert_eq!(rendered, "trellis for users");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("docs.toml"),
            "system = \"You answer questions about {{project}}.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.docs.system, "You answer questions about {{project}}.");
        // Files that don't exist keep their defaults
        assert!(prompts.browser.system.contains("Playwright"));
    }
}
