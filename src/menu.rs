//! Interactive configuration prompt and main menu.
//!
//! All functions take their input and output streams as arguments so the binary can pass
//! stdin/stdout and tests can pass in-memory buffers.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::settings::Settings;

const RULE_WIDTH: usize = 50;

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Extract,
    Organize,
    Package,
    Reconfigure,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::Extract),
            "2" => Ok(MenuChoice::Organize),
            "3" => Ok(MenuChoice::Package),
            "4" => Ok(MenuChoice::Reconfigure),
            "5" => Ok(MenuChoice::Exit),
            other => Err(format!("Invalid choice '{}'", other)),
        }
    }
}

/// Reads one line; `Ok(None)` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Asks for one value, keeping `default` on empty input or end of input.
fn prompt_value<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: &str,
) -> io::Result<String> {
    write!(output, "{} [{}]: ", label, default)?;
    output.flush()?;
    Ok(read_line(input)?
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string()))
}

/// Interactive setup: asks for the three directories, offering `current` as defaults.
pub fn prompt_settings<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    current: &Settings,
) -> io::Result<Settings> {
    writeln!(output, "\n{}", "=".repeat(RULE_WIDTH))?;
    writeln!(output, "PAGEMASTER - Configuration Setup")?;
    writeln!(output, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(
        output,
        "\nEnter the following paths (or press Enter to keep existing values):"
    )?;
    writeln!(
        output,
        "Note: the source directory should be a DIRECTORY containing .cbz files\n"
    )?;

    Ok(Settings {
        source_directory: prompt_value(
            input,
            output,
            "Source directory (directory with CBZ files)",
            &current.source_directory,
        )?,
        extract_directory: prompt_value(
            input,
            output,
            "Extract directory (where to extract images)",
            &current.extract_directory,
        )?,
        output_directory: prompt_value(
            input,
            output,
            "Output directory (where to organize chapters)",
            &current.output_directory,
        )?,
    })
}

/// Prints the main menu with the current settings.
pub fn render_menu<W: Write>(output: &mut W, settings: &Settings) -> io::Result<()> {
    writeln!(output, "\n{}", "=".repeat(RULE_WIDTH))?;
    writeln!(output, "PAGEMASTER - Main Menu")?;
    writeln!(output, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(output, "\nCurrent Configuration:")?;
    writeln!(output, "  Source directory:  {}", settings.source_directory)?;
    writeln!(output, "  Extract directory: {}", settings.extract_directory)?;
    writeln!(output, "  Output directory:  {}", settings.output_directory)?;
    writeln!(output, "\nOptions:")?;
    writeln!(output, "  1. Extract CBZ files")?;
    writeln!(output, "  2. Organize chapters")?;
    writeln!(output, "  3. Create CBZ files")?;
    writeln!(output, "  4. Reconfigure paths")?;
    writeln!(output, "  5. Exit")?;
    writeln!(output, "{}", "-".repeat(RULE_WIDTH))?;
    Ok(())
}

/// Prompts until a valid choice is entered. End of input counts as [`MenuChoice::Exit`].
pub fn read_choice<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<MenuChoice> {
    loop {
        write!(output, "Enter your choice (1-5): ")?;
        output.flush()?;
        match read_line(input)? {
            None => return Ok(MenuChoice::Exit),
            Some(line) => match line.parse::<MenuChoice>() {
                Ok(choice) => return Ok(choice),
                Err(_) => writeln!(output, "Invalid choice. Please try again.")?,
            },
        }
    }
}
