//! Command-line argument definitions using clap's derive API.
//!
//! Argument structs stay in this crate and convert into core types
//! (`FieldChange`, `StepId`, `jiff::civil::Date`) at the edge, so the core
//! library carries no clap attributes.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use jiff::civil::Date;
use serde_json::{Map, Value};
use waymark_core::{gateway::sqlite::builder::DEFAULT_OWNER, FieldChange, PlanId, StepId};

/// Author and publish multi-step plans from the terminal
///
/// Every invocation opens an editing session against the local plan
/// database, applies one action, and prints the result as markdown.
#[derive(Parser)]
#[command(version, about, name = "wm")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/waymark/waymark.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Owner the plans are created for and checked against
    #[arg(long, global = true, env = "WAYMARK_OWNER", default_value = DEFAULT_OWNER)]
    pub owner: String,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create plans and change their status
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Inspect and edit the steps of a plan
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from its basic details (step 1)
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// Show a plan and the completion of each step
    #[command(alias = "s")]
    Show(PlanIdArgs),
    /// Publish a plan once every step is complete
    Publish(PlanIdArgs),
    /// Pause a published plan until a date
    Pause(PausePlanArgs),
    /// Archive a plan, making it read-only
    #[command(alias = "a")]
    Archive(PlanIdArgs),
    /// Return an archived plan to draft
    #[command(alias = "u")]
    Unarchive(PlanIdArgs),
}

#[derive(Subcommand)]
pub enum StepCommands {
    /// Show the fields of a step and what is still missing
    #[command(alias = "s")]
    Show(StepArgs),
    /// Merge field values into a step and save it as a draft
    Set(SetStepArgs),
}

/// Basic details a new plan starts from.
#[derive(ClapArgs)]
pub struct CreatePlanArgs {
    /// Title of the plan
    #[arg(long)]
    pub title: String,
    /// City the plan takes place in
    #[arg(long)]
    pub city: String,
    /// State or region of the city
    #[arg(long)]
    pub state: String,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Short summary shown in listings
    #[arg(long)]
    pub summary: Option<String>,
}

impl From<CreatePlanArgs> for FieldChange {
    fn from(val: CreatePlanArgs) -> Self {
        let mut patch = Map::new();
        patch.insert("title".to_string(), Value::String(val.title));
        patch.insert("city".to_string(), Value::String(val.city));
        patch.insert("state".to_string(), Value::String(val.state));
        for (field, value) in [
            ("country", val.country),
            ("category", val.category),
            ("summary", val.summary),
        ] {
            if let Some(value) = value {
                patch.insert(field.to_string(), Value::String(value));
            }
        }
        FieldChange::user_edit(StepId::Basics, patch)
    }
}

#[derive(ClapArgs)]
pub struct PlanIdArgs {
    /// ID of the plan
    pub id: u64,
}

impl From<PlanIdArgs> for PlanId {
    fn from(val: PlanIdArgs) -> Self {
        PlanId(val.id)
    }
}

#[derive(ClapArgs)]
pub struct PausePlanArgs {
    /// ID of the plan
    pub id: u64,
    /// Date the plan becomes bookable again (YYYY-MM-DD)
    #[arg(long)]
    pub until: Date,
}

#[derive(ClapArgs)]
pub struct StepArgs {
    /// ID of the plan
    pub id: u64,
    /// Step name (`pricing`) or number (`3`)
    pub step: StepId,
}

#[derive(ClapArgs)]
pub struct SetStepArgs {
    /// ID of the plan
    pub id: u64,
    /// Step name (`pricing`) or number (`3`)
    pub step: StepId,
    /// Field assignment as key=value; the value is read as JSON when it
    /// parses, otherwise as a string
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, Value)>,
    /// JSON object of field values, applied before any --set
    #[arg(long, value_name = "OBJECT", value_parser = parse_object)]
    pub json: Option<Map<String, Value>>,
}

impl SetStepArgs {
    /// The combined field change; `--set` wins over `--json` for the same key.
    pub fn change(&self) -> FieldChange {
        let mut patch = self.json.clone().unwrap_or_default();
        for (field, value) in &self.assignments {
            patch.insert(field.clone(), value.clone());
        }
        FieldChange::user_edit(self.step, patch)
    }
}

fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn parse_object(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(s) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_assignment_values_prefer_json() {
        assert_eq!(
            parse_assignment("base_price=900").unwrap(),
            ("base_price".to_string(), json!(900))
        );
        assert_eq!(
            parse_assignment("currency=INR").unwrap(),
            ("currency".to_string(), json!("INR"))
        );
        assert_eq!(
            parse_assignment("languages=[\"en\",\"hi\"]").unwrap().1,
            json!(["en", "hi"])
        );
        assert!(parse_assignment("currency").is_err());
        assert!(parse_assignment("=INR").is_err());
    }

    #[test]
    fn test_object_must_be_an_object() {
        assert!(parse_object("{\"currency\": \"INR\"}").is_ok());
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("{").is_err());
    }

    #[test]
    fn test_set_overrides_json() {
        let args = Args::parse_from([
            "wm",
            "step",
            "set",
            "4",
            "pricing",
            "--json",
            "{\"currency\": \"USD\", \"base_price\": 10}",
            "--set",
            "currency=INR",
        ]);
        let Commands::Step {
            command: StepCommands::Set(set),
        } = args.command
        else {
            panic!("expected step set");
        };
        let change = set.change();
        assert_eq!(change.step, StepId::Pricing);
        assert_eq!(change.patch["currency"], json!("INR"));
        assert_eq!(change.patch["base_price"], json!(10));
    }

    #[test]
    fn test_step_accepts_ordinal() {
        let args = Args::parse_from(["wm", "step", "show", "1", "3"]);
        let Commands::Step {
            command: StepCommands::Show(show),
        } = args.command
        else {
            panic!("expected step show");
        };
        assert_eq!(show.step, StepId::Pricing);
    }
}
