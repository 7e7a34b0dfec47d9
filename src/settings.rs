use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::broker::PaperConfig;
use crate::execution::TradeConfig;
use crate::market::MarketConfig;
use crate::risk::{StakingConfig, StopThresholds};
use crate::session::SessionConfig;
use crate::strategy::{DirectionMode, GuardConfig, SignalConfig, StrategyKind};
use crate::Result;

/// Environment variable prefix, e.g. `OTCBOT__SESSION__MAX_CYCLES=10`
pub const ENV_PREFIX: &str = "OTCBOT";

/// The three money values asked for at startup when not configured
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyConfig {
    /// Overrides `staking.initial_stake`
    pub initial_stake: Option<f64>,
    /// Balance level that ends the session in profit
    pub target_profit: Option<f64>,
    /// Balance level that ends the session in loss
    pub stop_loss: Option<f64>,
}

/// Complete bot configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub strategy: StrategyKind,
    pub direction_mode: DirectionMode,
    pub money: MoneyConfig,
    pub signals: SignalConfig,
    pub guards: GuardConfig,
    pub staking: StakingConfig,
    pub market: MarketConfig,
    pub trade: TradeConfig,
    pub session: SessionConfig,
    pub paper: PaperConfig,
}

impl Settings {
    /// Defaults, then the optional TOML file, then `OTCBOT__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("session.assets"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Parse a TOML document layered over the defaults
    pub fn from_toml(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Fix the money values, returning the session's stop thresholds
    pub fn apply_money(&mut self, initial_stake: f64, target_profit: f64, stop_loss: f64) -> StopThresholds {
        self.money = MoneyConfig {
            initial_stake: Some(initial_stake),
            target_profit: Some(target_profit),
            stop_loss: Some(stop_loss),
        };
        self.staking.initial_stake = initial_stake;

        StopThresholds {
            target_profit,
            stop_loss,
        }
    }
}
