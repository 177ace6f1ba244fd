//! Output formatting.
//!
//! This module renders analysis results for the two output modes:
//! - Human-readable terminal output with colors
//! - JSON output for machine consumption
//!
//! In terminal mode diagnostics are rendered separately so the caller can
//! send them to stderr; in JSON mode they are part of the document.

use crate::capabilities::CapabilityRules;
use crate::checker::Severity;
use crate::error::Diagnostic;
use crate::types::ClassDescriptor;
use crate::Analysis;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

/// Format an analysis (facts or error, plus diagnostics) as JSON
pub fn format_analysis_json(analysis: &Analysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

/// Format the manifest facts (or the fatal error) for terminal display
pub fn format_analysis_terminal(analysis: &Analysis) -> String {
    let mut output = String::new();

    match &analysis.outcome {
        Ok(facts) => {
            output.push_str(&format!("{} {}\n", "module".bright_white().bold(), facts.module));
            push_single(&mut output, "main", facts.entry_point.as_deref());
            push_single(&mut output, "bootstrapper", facts.bootstrap_hook.as_deref());
            push_single(&mut output, "loader", facts.loader.as_deref());
            push_list(&mut output, "listeners", &facts.listeners);
            push_list(&mut output, "tasks", &facts.scheduled_tasks);
        }
        Err(err) => {
            output.push_str(&format!("{} {}\n", "error:".bright_red().bold(), err));
        }
    }

    output
}

fn push_single(output: &mut String, label: &str, value: Option<&str>) {
    let rendered = match value {
        Some(class) => class.bright_green().to_string(),
        None => "-".dimmed().to_string(),
    };
    output.push_str(&format!("├─ {:<13} {}\n", label.bright_white(), rendered));
}

fn push_list(output: &mut String, label: &str, classes: &[String]) {
    output.push_str(&format!("├─ {} ({})\n", label.bright_white(), classes.len()));
    for class in classes {
        output.push_str(&format!("│    {}\n", class.cyan()));
    }
}

/// Format non-fatal diagnostics, one per line
pub fn format_diagnostics_terminal(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for diagnostic in diagnostics {
        let label = match diagnostic {
            Diagnostic::MalformedClass(_) => "malformed".bright_yellow(),
            Diagnostic::DuplicateClass { .. } => "duplicate".bright_yellow(),
            Diagnostic::Violation(violation) if violation.severity == Severity::Fatal => "fatal".bright_red(),
            Diagnostic::Violation(_) => "warning".yellow(),
        };
        output.push_str(&format!("{} {}\n", label, diagnostic));
    }
    output
}

/// Format loaded class descriptors as JSON
pub fn format_classes_json(classes: &[ClassDescriptor], diagnostics: &[Diagnostic]) -> Result<String> {
    #[derive(Serialize)]
    struct ClassDump<'a> {
        classes: &'a [ClassDescriptor],
        diagnostics: &'a [Diagnostic],
    }

    Ok(serde_json::to_string_pretty(&ClassDump { classes, diagnostics })?)
}

/// Format loaded class descriptors as a tree of names and supertypes
pub fn format_classes_terminal(classes: &[ClassDescriptor]) -> String {
    let mut output = String::new();
    for class in classes {
        let mut supertypes: Vec<&str> = class.superclass.iter().map(String::as_str).collect();
        supertypes.extend(class.interfaces.iter().map(String::as_str));

        output.push_str(&format!("├─ {}", class.name.bright_white()));
        if !supertypes.is_empty() {
            output.push_str(&format!(" : {}", supertypes.join(", ").dimmed()));
        }
        output.push('\n');
        if let Some(outer) = &class.enclosing {
            output.push_str(&format!("│    nested in {}\n", outer));
        }
    }
    output
}

/// Format the rule table as JSON
pub fn format_rules_json(rules: &CapabilityRules) -> Result<String> {
    Ok(serde_json::to_string_pretty(rules.rules())?)
}

/// Format the rule table for terminal display
pub fn format_rules_terminal(rules: &CapabilityRules) -> String {
    let mut output = String::new();
    for rule in rules.rules() {
        output.push_str(&format!(
            "├─ {} {} {}\n",
            rule.id.bright_white(),
            rule.kind.to_string().cyan(),
            rule.target
        ));
        if !rule.desc.is_empty() {
            output.push_str(&format!("│    {}\n", rule.desc.dimmed()));
        }
        if let Some(members) = &rule.members {
            output.push_str(&format!("│    requires {}\n", members));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::ManifestFacts;
    use crate::error::{MalformedClassError, ResolveError};

    fn sample_analysis() -> Analysis {
        Analysis {
            outcome: Ok(ManifestFacts {
                module: "sample".to_string(),
                entry_point: Some("s.Main".to_string()),
                bootstrap_hook: None,
                loader: None,
                listeners: vec!["s.Join".to_string()],
                scheduled_tasks: vec![],
            }),
            diagnostics: vec![Diagnostic::MalformedClass(MalformedClassError {
                origin: "s/Broken.class".to_string(),
                reason: "Invalid class file magic number".to_string(),
            })],
        }
    }

    #[test]
    fn test_json_contains_facts_and_diagnostics() {
        let json = format_analysis_json(&sample_analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["facts"]["entry_point"], "s.Main");
        assert_eq!(value["outcome"]["facts"]["listeners"][0], "s.Join");
        assert_eq!(value["diagnostics"][0]["type"], "malformed_class");
        assert_eq!(value["diagnostics"][0]["origin"], "s/Broken.class");
    }

    #[test]
    fn test_json_error_outcome() {
        let analysis = Analysis {
            outcome: Err(ResolveError::MultipleEntryPoints {
                candidates: vec!["s.A".to_string(), "s.B".to_string()],
            }),
            diagnostics: vec![],
        };
        let json = format_analysis_json(&analysis).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["error"]["error"], "multiple_entry_points");
        assert_eq!(value["outcome"]["error"]["candidates"][1], "s.B");
    }

    #[test]
    fn test_terminal_lists_facts() {
        colored::control::set_override(false);
        let text = format_analysis_terminal(&sample_analysis());
        assert!(text.contains("module sample"));
        assert!(text.contains("s.Main"));
        assert!(text.contains("listeners (1)"));
        assert!(text.contains("tasks (0)"));
    }

    #[test]
    fn test_terminal_diagnostics() {
        colored::control::set_override(false);
        let text = format_diagnostics_terminal(&sample_analysis().diagnostics);
        assert!(text.starts_with("malformed malformed class s/Broken.class"));
    }

    #[test]
    fn test_warning_shows_outer_class() {
        use crate::capabilities::{CapabilityMatch, MemberShape};
        use crate::config::AnalysisConfig;
        use crate::types::CapabilityKind;

        colored::control::set_override(false);
        let lazy = CapabilityMatch {
            class: "s.Main$1".to_string(),
            node: 0,
            kind: CapabilityKind::ScheduledTask,
            rule: "java/runnable-task".to_string(),
            origin_depth: 0,
            via: Some("java.lang.Runnable".to_string()),
            shape: MemberShape::Missing,
            enclosing: Some("s.Main".to_string()),
        };
        let set = crate::checker::check(vec![lazy], "sample", &AnalysisConfig::library());
        let diagnostics: Vec<_> = set.warnings().cloned().map(Diagnostic::Violation).collect();

        let text = format_diagnostics_terminal(&diagnostics);
        assert!(text.starts_with("warning scheduled_task s.Main$1 in s.Main (warning)"), "{}", text);

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json[0]["type"], "violation");
        assert_eq!(json[0]["enclosing"], "s.Main");
    }

    #[test]
    fn test_rules_listing() {
        colored::control::set_override(false);
        let text = format_rules_terminal(&CapabilityRules::paper());
        assert!(text.contains("paper/main entry_point org.bukkit.plugin.java.JavaPlugin"));
        assert!(text.contains("requires @org.bukkit.event.EventHandler method"));
    }
}
