//! Line protocol for the wizard.
//!
//! Every input line is either a JSON object, committed for the current step,
//! or a `#` command. Output lines start with a tag so a script can follow
//! along without parsing prose.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use sheet_core::persist::{list_sheet_saves, sheet_save_path};
use sheet_core::validator::is_complete;
use sheet_core::{
    FieldErrors, MemoryStore, SavedSheet, SessionError, StepId, Submission, WizardConfig,
    WizardSession,
};
use tracing::{debug, warn};

/// What the loop does after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A wizard session plus the settings of the driver around it.
pub struct HeadlessDriver {
    config: WizardConfig,
    session: WizardSession<MemoryStore>,
}

impl HeadlessDriver {
    pub fn new(config: WizardConfig) -> Self {
        let session = WizardSession::new(&config, MemoryStore::new());
        Self { config, session }
    }

    pub fn session(&self) -> &WizardSession<MemoryStore> {
        &self.session
    }

    /// Handle one input line, returning the output lines.
    pub async fn handle_line(&mut self, line: &str) -> (Vec<String>, Flow) {
        let line = line.trim();
        if line.is_empty() {
            return (Vec::new(), Flow::Continue);
        }

        let Some(command) = line.strip_prefix('#') else {
            return (self.submit(line).await, Flow::Continue);
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let output = match parts.first().copied() {
            Some("quit") | Some("exit") => return (vec!["Goodbye!".to_string()], Flow::Quit),
            Some("step") => vec![self.step_line()],
            Some("goto") => match parts.get(1) {
                Some(raw) => self.goto(raw),
                None => vec!["[ERROR] Usage: #goto <step>".to_string()],
            },
            Some("roll") => self.roll(),
            Some("sheet") => self.sheet(),
            Some("status") => self.status(),
            Some("save") => {
                let name = parts[1..].join(" ");
                self.save(&name).await
            }
            Some("load") => {
                if parts.len() > 1 {
                    self.load(&parts[1..].join(" ")).await
                } else {
                    vec!["[ERROR] Usage: #load <name>".to_string()]
                }
            }
            Some("list") => self.list().await,
            Some("restart") => match self.session.restart() {
                Ok(()) => vec![format!("[NEXT] {}", self.session.current_step())],
                Err(e) => vec![format!("[ERROR] {e}")],
            },
            Some("help") => help_lines(),
            _ => vec!["[ERROR] Unknown command. Type #help for help.".to_string()],
        };
        (output, Flow::Continue)
    }

    async fn submit(&mut self, line: &str) -> Vec<String> {
        let input: Value = match serde_json::from_str(line) {
            Ok(input) => input,
            Err(e) => return vec![format!("[ERROR] Input is not JSON: {e}")],
        };

        match self.session.submit(&input) {
            Ok(Submission::Accepted { next, redirected }) => {
                let mut output = if redirected {
                    vec![format!("[REDIRECT] {next}")]
                } else {
                    vec![format!("[NEXT] {next}")]
                };
                if self.config.autosave && !redirected {
                    output.extend(self.save("").await);
                }
                output
            }
            Ok(Submission::Rejected(errors)) => invalid_lines(&errors),
            Err(e) => {
                warn!("Commit failed: {e}");
                vec![format!("[ERROR] {e}")]
            }
        }
    }

    fn step_line(&self) -> String {
        let step = self.session.current_step();
        format!("[STEP] {step} - {}", step.title())
    }

    fn goto(&mut self, raw: &str) -> Vec<String> {
        let requested: StepId = match raw.parse() {
            Ok(step) => step,
            Err(e) => return vec![format!("[ERROR] {e}")],
        };
        match self.session.goto(requested) {
            Ok(landed) if landed == requested => vec![format!("[NEXT] {landed}")],
            Ok(landed) => vec![format!("[REDIRECT] {landed}")],
            Err(e) => vec![format!("[ERROR] {e}")],
        }
    }

    fn roll(&mut self) -> Vec<String> {
        let rolls = match self.session.roll_attributes() {
            Ok(rolls) => rolls,
            Err(e) => return vec![format!("[ERROR] {e}")],
        };
        let mut output: Vec<String> = rolls.iter().map(|roll| format!("[ROLL] {roll}")).collect();
        let totals: Vec<u8> = rolls.iter().map(|roll| roll.total).collect();
        output.push(format!(
            "[ROLL] totals {}",
            totals
                .iter()
                .map(u8::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ));
        output
    }

    fn sheet(&self) -> Vec<String> {
        match serde_json::to_string_pretty(self.session.document()) {
            Ok(json) => std::iter::once("[SHEET]".to_string())
                .chain(json.lines().map(String::from))
                .collect(),
            Err(e) => vec![format!("[ERROR] {e}")],
        }
    }

    fn status(&self) -> Vec<String> {
        let document = self.session.document();
        let mut output = vec![
            "[STATUS]".to_string(),
            format!("  Character: {}", document.display_name()),
            format!("  Step: {}", self.session.current_step()),
            format!("  Complete: {}", is_complete(document)),
        ];
        if let Some(origin) = document.origin {
            output.push(format!("  Origin: {}", origin.title()));
        }
        if let Some(specialization) = document.specialization {
            output.push(format!("  Specialization: {}", specialization.title()));
        }
        if document.origin.is_some() {
            output.push(format!("  Spell cap: {}", document.spell_cap()));
        }
        output
    }

    async fn save(&mut self, name: &str) -> Vec<String> {
        let name = if name.trim().is_empty() {
            self.session.document().display_name().to_string()
        } else {
            name.to_string()
        };
        let path = sheet_save_path(&self.config.save_dir, &name);
        match self.session.snapshot().save_json(&path).await {
            Ok(()) => vec![format!("[SAVED] {}", path.display())],
            Err(e) => vec![format!("[ERROR] Save failed: {e}")],
        }
    }

    async fn load(&mut self, name: &str) -> Vec<String> {
        let path = self.resolve_save(name);
        match self.restore_from(&path).await {
            Ok(()) => vec![
                format!("[LOADED] {}", path.display()),
                self.step_line(),
            ],
            Err(e) => vec![format!("[ERROR] Load failed: {e}")],
        }
    }

    /// Load a save file into the session.
    pub async fn restore_from(&mut self, path: &Path) -> Result<(), SessionError> {
        let saved = SavedSheet::load_json(path).await?;
        self.session.restore(saved)?;
        debug!("Restored session at '{}'", self.session.current_step());
        Ok(())
    }

    async fn list(&self) -> Vec<String> {
        match list_sheet_saves(&self.config.save_dir).await {
            Ok(saves) if saves.is_empty() => vec!["[LIST] no saved sheets".to_string()],
            Ok(saves) => saves
                .iter()
                .map(|save| {
                    let status = if save.metadata.complete {
                        "complete"
                    } else {
                        "in progress"
                    };
                    format!(
                        "[LIST] {} ({}, {status}) {}",
                        save.metadata.character_name,
                        save.metadata.step,
                        save.path.display()
                    )
                })
                .collect(),
            Err(e) => vec![format!("[ERROR] {e}")],
        }
    }

    /// A bare name is looked up in the save directory; anything that looks
    /// like a path is used as is.
    fn resolve_save(&self, name: &str) -> PathBuf {
        if name.ends_with(".json") || name.contains(std::path::MAIN_SEPARATOR) {
            PathBuf::from(name)
        } else {
            sheet_save_path(&self.config.save_dir, name)
        }
    }
}

fn invalid_lines(errors: &FieldErrors) -> Vec<String> {
    let mut output = vec![format!("[INVALID] {} field(s)", errors.len())];
    for (path, messages) in errors.messages() {
        for message in messages {
            output.push(format!("  {path}: {message}"));
        }
    }
    output
}

fn help_lines() -> Vec<String> {
    [
        "[HELP]",
        "  {...}            - Commit a JSON object for the current step",
        "  #step            - Show the current step",
        "  #goto <step>     - Jump to a step (guards may redirect)",
        "  #roll            - Roll 4d6-drop-lowest six times for the rolled method",
        "  #sheet           - Show the document as JSON",
        "  #status          - Show progress",
        "  #save [name]     - Save the sheet",
        "  #load <name>     - Load a saved sheet",
        "  #list            - List saved sheets",
        "  #restart         - Start over",
        "  #quit            - Exit",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Run the wizard over stdin and stdout.
pub async fn run_headless(config: WizardConfig, resume: Option<PathBuf>) -> Result<(), SessionError> {
    let mut driver = HeadlessDriver::new(config);
    if let Some(path) = resume {
        driver.restore_from(&path).await?;
        println!("[LOADED] {}", path.display());
    }

    println!("=== Character Sheet Wizard ===");
    println!("{}", driver.step_line());
    println!("Type #help for commands.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let (output, flow) = driver.handle_line(&line).await;
        for out in output {
            println!("{out}");
        }
        stdout.flush().ok();

        if flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheet_core::catalog::Talent;
    use sheet_core::testing::fixtures;
    use tempfile::TempDir;

    async fn send(driver: &mut HeadlessDriver, input: &Value) -> Vec<String> {
        driver.handle_line(&input.to_string()).await.0
    }

    #[tokio::test]
    async fn test_json_line_commits_step() {
        let mut driver = HeadlessDriver::new(WizardConfig::new());
        let output = send(&mut driver, &fixtures::base()).await;
        assert_eq!(output, vec!["[NEXT] personal".to_string()]);

        let (output, _) = driver.handle_line("{\"ideals\": []}").await;
        assert!(output[0].starts_with("[INVALID]"));
        assert!(output.iter().any(|l| l.contains("personality.ideals")));
    }

    #[tokio::test]
    async fn test_commands() {
        let mut driver = HeadlessDriver::new(WizardConfig::new().with_roll_seed(3));

        let (output, _) = driver.handle_line("#goto spells").await;
        assert_eq!(output, vec!["[REDIRECT] origin".to_string()]);

        let (output, _) = driver.handle_line("#roll").await;
        assert_eq!(output.len(), 7);
        assert!(output.iter().all(|l| l.starts_with("[ROLL]")));

        let (output, _) = driver.handle_line("#goto nowhere").await;
        assert!(output[0].starts_with("[ERROR]"));

        let (output, _) = driver.handle_line("not json").await;
        assert!(output[0].starts_with("[ERROR]"));

        let (output, flow) = driver.handle_line("#quit").await;
        assert_eq!(flow, Flow::Quit);
        assert_eq!(output, vec!["Goodbye!".to_string()]);
    }

    #[tokio::test]
    async fn test_rolled_attributes_use_the_last_roll() {
        let mut driver = HeadlessDriver::new(WizardConfig::new().with_roll_seed(11));
        send(&mut driver, &fixtures::base()).await;
        send(&mut driver, &fixtures::personal()).await;

        let output = send(&mut driver, &fixtures::rolled([18; 6])).await;
        assert!(output[0].starts_with("[INVALID]"));

        driver.handle_line("#roll").await;
        let roll = driver
            .session()
            .document()
            .pending_roll
            .expect("Should keep the roll");
        let output = send(&mut driver, &fixtures::rolled(roll)).await;
        assert_eq!(output, vec!["[NEXT] origin".to_string()]);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let config = WizardConfig::new().with_save_dir(temp.path());
        let mut driver = HeadlessDriver::new(config.clone());

        for input in [
            fixtures::base(),
            fixtures::personal(),
            fixtures::fixed_attributes(),
            fixtures::innate_origin(Talent::EmergencyVow),
        ] {
            send(&mut driver, &input).await;
        }
        let (output, _) = driver.handle_line("#save yuji").await;
        assert!(output[0].starts_with("[SAVED]"));

        let (output, _) = driver.handle_line("#list").await;
        assert!(output[0].contains("Yuji Itadori"));

        let mut other = HeadlessDriver::new(config);
        let (output, _) = other.handle_line("#load yuji").await;
        assert!(output[0].starts_with("[LOADED]"));
        assert_eq!(output[1], "[STEP] specialization - Specialization");
        assert_eq!(other.session().document(), driver.session().document());
    }
}
