use clap::Subcommand;

use super::baseline::BaselineArgs;
use super::check::CheckArgs;
use super::config::ConfigArgs;
use super::generate::GenerateArgs;
use super::heal::HealArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Author a page object, test data and test spec for a feature
    Generate(GenerateArgs),

    /// Repair a broken selector in a test source file
    Heal(HealArgs),

    /// Compare a page screenshot against its baseline
    Check(CheckArgs),

    /// Promote or recapture visual baselines
    Baseline(BaselineArgs),

    /// Inspect and edit uitestgen configuration
    Config(ConfigArgs),
}
