//! Driving Scene Reasoning Library
//!
//! Turns perceived driving scenes into language-model prompts and
//! supervision targets, and turns model answers back into trajectories.
//!
//! For each sample the library produces:
//!
//! - a **user message** describing nearby objects, ego state, history and
//!   mission goal;
//! - a **chain of thought**: notable objects, their potential effects and a
//!   rule-based meta action;
//! - the **trajectory text** `[(x1,y1), ..., (x6,y6)]`, decodable with a
//!   narrow literal grammar.
//!
//! # Features
//!
//! - **Deterministic**: the same record and configuration always give the
//!   same text, byte for byte
//! - **Checked at the boundary**: cached samples are validated into typed
//!   records once ([`validation`])
//! - **Recoverable decode failures**: undecodable answers mark a token
//!   invalid instead of stopping a run ([`batch::BatchResult`])
//!
//! # Quick Start
//!
//! ```
//! use drive_reasoning::reasoning::{assistant_message, AssistantTarget};
//! use drive_reasoning::{decode_trajectory, store_from_json, DecodeMode, ReasoningConfig};
//!
//! let json = r#"{"tok": {
//!     "gt_boxes": [[0.5, 30.0, 0.0, 1.9, 4.5, 1.5, 0.0]],
//!     "gt_names": ["vehicle.car"],
//!     "gt_agent_fut_trajs": [[0,1, 0,1, 0,1, 0,1, 0,1, 0,1]],
//!     "gt_agent_fut_masks": [[1, 1, 1, 1, 1, 1]],
//!     "gt_ego_lcf_feat": [0, 8, 0, 0, 0, 4.08, 1.85, 8, 0],
//!     "gt_ego_his_trajs": [[0,-12], [0,-8], [0,-4], [0,0]],
//!     "gt_ego_his_diff": [[0,4], [0,4], [0,4]],
//!     "gt_ego_fut_trajs": [[0,0], [0,4], [0,8], [0,12], [0,16], [0,20], [0,24]],
//!     "gt_ego_fut_diff": [[0,4], [0,4], [0,4], [0,4], [0,4], [0,4]],
//!     "gt_ego_fut_cmd": [0, 0, 1]
//! }}"#;
//!
//! let store = store_from_json(json)?;
//! let config = ReasoningConfig::default();
//!
//! let answer = assistant_message(&store["tok"], &config, AssistantTarget::Reasoning)?;
//! assert!(answer.contains("Meta Action: MOVE FORWARD WITH A CONSTANT SPEED"));
//!
//! let waypoints = decode_trajectory(&answer, DecodeMode::Strict)?;
//! assert_eq!(waypoints.len(), 6);
//! # Ok::<(), drive_reasoning::ReasoningError>(())
//! ```
//!
//! # Output Forms
//!
//! | Function | Output | Use Case |
//! |----------|--------|----------|
//! | [`prompt::user_message`] | scene description | Model input |
//! | [`reasoning::chain_of_thoughts`] | thoughts + meta action | Reasoning target |
//! | [`reasoning::assistant_message`] | thoughts + meta action + trajectory | Fine-tuning target |
//! | [`encode_trajectory`] | `[(x,y), ...]` | Trajectory-only target |
//!
//! # Presets
//!
//! ```
//! use drive_reasoning::ReasoningConfig;
//!
//! let compact = ReasoningConfig::compact();
//! let verbose = ReasoningConfig::verbose();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]

pub mod batch;
pub mod collision;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod kinematics;
pub mod math;
pub mod meta_action;
pub mod prompt;
pub mod reasoning;
pub mod record;
pub mod scene;
pub mod transcript;
pub mod validation;

// Re-exports for convenient access
pub use batch::{BatchResult, TokenCounter};
pub use collision::{CollisionHit, CollisionMargins, Footprint};
pub use config::{DescriptionMode, ReasoningConfig, ZeroLateralPolicy};
pub use decoder::{decode_trajectory, DecodeMode};
pub use encoder::encode_trajectory;
pub use error::{ReasoningError, Result};
pub use math::Point2;
pub use meta_action::{LateralClass, MetaAction, SpeedClass};
pub use record::{Agent, EgoState, MissionCommand, SampleRecord, SampleStore};
pub use validation::{store_from_json, RawSample};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
