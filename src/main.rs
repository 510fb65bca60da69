//! Reefswap — underwater match-3 puzzle game in the terminal.

mod app;
mod board;
mod cascade;
mod deadlock;
mod engine;
mod error;
mod events;
mod input;
mod matcher;
mod rng;
mod theme;
mod ui;
mod whirlpool;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u32,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let seed = args.seed.unwrap_or_else(clock_seed);
    let config = GameConfig {
        seed,
        no_animation: args.no_animation,
    };
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Seed from the clock when --seed is not given.
fn clock_seed() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(1)
}

/// Underwater match-3 puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "reefswap",
    version,
    about = "Underwater match-3 puzzle in the terminal. Swap adjacent jellyfish to line up three or more; big clusters leave whirlpools that sweep whole rows.",
    long_about = "Reefswap is a terminal match-3 puzzle game.\n\n\
        Swap adjacent jellyfish to line up three or more of a colour. Matched runs clear, \
        everything above falls, and chained matches multiply the combo. Clusters of five or \
        more leave a whirlpool behind; activate it to sweep whole rows. Levelling up reveals \
        a block of the treasure map.\n\n\
        CONTROLS (normal):\n  Arrows      Move cursor   Enter/Space  Select / swap / activate\n  X/Backspace Deselect      P            Pause      Q / Esc    Quit   R  Restart\n\n\
        CONTROLS (vim):\n  h/j/k/l     Move cursor   Space        Select / swap / activate\n  x           Deselect      p            Pause      q          Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme), and --seed to replay a session."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Board RNG seed. The same seed replays the same session; random when not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Disable the clear-fade animation (popups still show).
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
