//! `rpk` command reference, scraped from `--help` output.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::PathBuf;

use regex::Regex;
use serde::Serialize;

use super::postprocess::{collapse_blank_lines, table_cell};
use super::write_output;
use crate::config::Config;
use crate::error::{GenerationReport, Result};
use crate::exec::{CommandSpec, ensure_tool, run};

/// Subcommands that only exist for the shell, not for users
const SKIPPED_COMMANDS: [&str; 2] = ["help", "completion"];

#[derive(Debug, Clone)]
pub struct RpkDocsOptions {
    pub rpk: String,
    pub output_dir: Option<PathBuf>,
    pub max_depth: usize,
}

impl Default for RpkDocsOptions {
    fn default() -> Self {
        Self {
            rpk: "rpk".to_string(),
            output_dir: None,
            max_depth: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Flag {
    pub short: Option<String>,
    pub long: String,
    pub value_type: Option<String>,
    pub description: String,
}

/// Parsed `--help` output of one command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HelpPage {
    pub description: String,
    pub usage: Vec<String>,
    pub aliases: Vec<String>,
    pub subcommands: Vec<(String, String)>,
    pub flags: Vec<Flag>,
    pub global_flags: Vec<Flag>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Description,
    Usage,
    Aliases,
    Commands,
    Flags,
    GlobalFlags,
    Other,
}

fn section_for(header: &str) -> Section {
    match header {
        "Usage" => Section::Usage,
        "Aliases" => Section::Aliases,
        "Available Commands" | "Commands" => Section::Commands,
        "Flags" => Section::Flags,
        "Global Flags" => Section::GlobalFlags,
        _ => Section::Other,
    }
}

/// Parse cobra-style help text
pub fn parse_help(text: &str) -> Result<HelpPage> {
    let header_re = Regex::new(r"^([A-Z][A-Za-z ]*):\s*$")?;
    let flag_re = Regex::new(
        r"^\s+(?:-([A-Za-z0-9]),\s+)?--([A-Za-z0-9][\w-]*)(?: ([A-Za-z][\w\[\]]*))?\s{2,}(\S.*)$",
    )?;
    let command_re = Regex::new(r"^\s+([a-z0-9][\w-]*)\s{2,}(\S.*)$")?;

    let mut page = HelpPage::default();
    let mut section = Section::Description;
    let mut description = Vec::new();

    for line in text.lines() {
        if let Some(caps) = header_re.captures(line) {
            section = section_for(&caps[1]);
            continue;
        }
        match section {
            Section::Description => description.push(line.trim_end()),
            Section::Usage => {
                if !line.trim().is_empty() {
                    page.usage.push(line.trim().to_string());
                }
            }
            Section::Aliases => {
                page.aliases.extend(
                    line.split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                );
            }
            Section::Commands => {
                if let Some(caps) = command_re.captures(line) {
                    page.subcommands.push((caps[1].to_string(), caps[2].trim().to_string()));
                }
            }
            Section::Flags | Section::GlobalFlags => {
                // An unindented line such as `Use "rpk ..." for more information` ends the list
                if !line.is_empty() && !line.starts_with(char::is_whitespace) {
                    section = Section::Other;
                    continue;
                }
                let flags = if section == Section::Flags {
                    &mut page.flags
                } else {
                    &mut page.global_flags
                };
                if let Some(caps) = flag_re.captures(line) {
                    flags.push(Flag {
                        short: caps.get(1).map(|m| m.as_str().to_string()),
                        long: caps[2].to_string(),
                        value_type: caps.get(3).map(|m| m.as_str().to_string()),
                        description: caps[4].trim().to_string(),
                    });
                } else if !line.trim().is_empty() {
                    // wrapped description of the previous flag
                    if let Some(last) = flags.last_mut() {
                        last.description.push(' ');
                        last.description.push_str(line.trim());
                    }
                }
            }
            Section::Other => {}
        }
    }

    page.description = description.join("\n").trim().to_string();
    Ok(page)
}

fn render_flags(out: &mut String, title: &str, flags: &[Flag]) {
    if flags.is_empty() {
        return;
    }
    let _ = writeln!(out, "== {title}\n");
    out.push_str("[cols=\"1m,1a,2a\"]\n|===\n|*Value* |*Type* |*Description*\n\n");
    for flag in flags {
        let name = match &flag.short {
            Some(short) => format!("-{short}, --{}", flag.long),
            None => format!("--{}", flag.long),
        };
        let _ = writeln!(
            out,
            "|{} |{} |{}\n",
            name,
            flag.value_type.as_deref().unwrap_or("-"),
            table_cell(&flag.description)
        );
    }
    out.push_str("|===\n\n");
}

/// Render the AsciiDoc page for `rpk <path>`
pub fn render_command_page(path: &[String], page: &HelpPage) -> String {
    let full = std::iter::once("rpk")
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    let summary = page.description.lines().next().unwrap_or("").trim();

    let mut out = String::new();
    let _ = writeln!(out, "= {full}");
    if !summary.is_empty() {
        let _ = writeln!(out, ":description: {}", summary.trim_end_matches('.'));
    }
    out.push('\n');
    if !page.description.is_empty() {
        let _ = writeln!(out, "{}\n", page.description);
    }
    if !page.usage.is_empty() {
        out.push_str("== Usage\n\n[,bash]\n----\n");
        for usage in &page.usage {
            let _ = writeln!(out, "{usage}");
        }
        out.push_str("----\n\n");
    }
    if !page.aliases.is_empty() {
        out.push_str("== Aliases\n\n[,bash]\n----\n");
        let _ = writeln!(out, "{}", page.aliases.join(", "));
        out.push_str("----\n\n");
    }
    render_flags(&mut out, "Flags", &page.flags);
    if path.is_empty() {
        render_flags(&mut out, "Global flags", &page.global_flags);
    }
    collapse_blank_lines(&out)
}

pub fn page_file_name(path: &[String]) -> String {
    if path.is_empty() {
        "rpk.adoc".to_string()
    } else {
        format!("rpk-{}.adoc", path.join("-"))
    }
}

pub async fn generate_rpk_docs(config: &Config, options: &RpkDocsOptions) -> Result<GenerationReport> {
    ensure_tool(
        &options.rpk,
        "Install rpk: https://docs.redpanda.com/current/get-started/rpk-install/",
    )?;
    let out_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.docs_root.join("modules/reference/pages/rpk"));

    let mut report = GenerationReport::default();
    let mut queue: VecDeque<Vec<String>> = VecDeque::from([Vec::new()]);
    let mut flags = 0;

    while let Some(path) = queue.pop_front() {
        let output = run(CommandSpec::new(&options.rpk).args(path.iter()).arg("--help")).await?;
        let page = parse_help(&output.stdout)?;

        write_output(
            &out_dir.join(page_file_name(&path)),
            &render_command_page(&path, &page),
            &mut report,
        )?;
        flags += page.flags.len();

        if path.len() < options.max_depth {
            for (name, _) in &page.subcommands {
                if SKIPPED_COMMANDS.contains(&name.as_str()) {
                    continue;
                }
                let mut child = path.clone();
                child.push(name.clone());
                queue.push_back(child);
            }
        }
    }

    report.count("commands", report.files.len());
    report.count("flags", flags);
    Ok(report)
}
