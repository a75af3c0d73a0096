//! Record validation at the data boundary.
//!
//! Externally cached samples arrive as loosely shaped dictionaries of
//! arrays. This module defines their serde form ([`RawSample`]) and
//! converts it into a typed [`SampleRecord`], rejecting malformed records
//! here instead of letting index errors surface deep in the reasoning
//! logic. Every failure is a [`ReasoningError::DataInvariant`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ReasoningError, Result};
use crate::math::{point, Point2};
use crate::record::{
    Agent, EgoState, MissionCommand, SampleRecord, SampleStore, FUTURE_STEPS, HORIZON,
    LCF_FEAT_LEN,
};

/// Serde form of one cached sample, keyed like the dataset cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Object boxes, `N x 7`.
    pub gt_boxes: Vec<Vec<f64>>,
    /// Object category labels, `N`.
    pub gt_names: Vec<String>,
    /// Relative future displacements, `N x 12` (six interleaved x/y pairs).
    pub gt_agent_fut_trajs: Vec<Vec<f64>>,
    /// Future validity, `N x 6`, positive means valid.
    pub gt_agent_fut_masks: Vec<Vec<f64>>,
    /// Ego local features, `9`.
    pub gt_ego_lcf_feat: Vec<f64>,
    /// Ego history positions, `H x 2`.
    pub gt_ego_his_trajs: Vec<[f64; 2]>,
    /// Ego history step differences, `H' x 2`.
    pub gt_ego_his_diff: Vec<[f64; 2]>,
    /// Ego future positions, `7 x 2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt_ego_fut_trajs: Option<Vec<[f64; 2]>>,
    /// Ego future step differences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt_ego_fut_diff: Option<Vec<[f64; 2]>>,
    /// Mission command `(right, left, forward)`.
    pub gt_ego_fut_cmd: Vec<f64>,
}

impl RawSample {
    /// Validate and convert into a typed record.
    ///
    /// # Errors
    ///
    /// Returns [`ReasoningError::DataInvariant`] on any shape violation or an
    /// invalid mission command.
    pub fn into_record(self, token: impl Into<String>) -> Result<SampleRecord> {
        let token = token.into();
        let n = self.gt_boxes.len();
        check_len("gt_names", self.gt_names.len(), n)?;
        check_len("gt_agent_fut_trajs", self.gt_agent_fut_trajs.len(), n)?;
        check_len("gt_agent_fut_masks", self.gt_agent_fut_masks.len(), n)?;

        let objects = self
            .gt_names
            .into_iter()
            .zip(&self.gt_boxes)
            .zip(self.gt_agent_fut_trajs.iter().zip(&self.gt_agent_fut_masks))
            .enumerate()
            .map(|(i, ((name, bbox), (offsets, mask)))| build_agent(i, name, bbox, offsets, mask))
            .collect::<Result<Vec<_>>>()?;

        let lcf_feat: [f64; LCF_FEAT_LEN] = to_array("gt_ego_lcf_feat", &self.gt_ego_lcf_feat)?;
        let cmd: [f64; 3] = to_array("gt_ego_fut_cmd", &self.gt_ego_fut_cmd)?;
        let mission = MissionCommand::from_one_hot(cmd)?;

        let future_trajectory = match self.gt_ego_fut_trajs {
            Some(rows) => {
                check_len("gt_ego_fut_trajs", rows.len(), HORIZON)?;
                let points: Vec<Point2> = rows.into_iter().map(point).collect();
                Some(to_array("gt_ego_fut_trajs", &points)?)
            }
            None => None,
        };
        let future_diff = self
            .gt_ego_fut_diff
            .map(|rows| rows.into_iter().map(point).collect());

        let ego = EgoState::new(
            lcf_feat,
            self.gt_ego_his_trajs.into_iter().map(point).collect(),
            self.gt_ego_his_diff.into_iter().map(point).collect(),
            future_trajectory,
            future_diff,
            mission,
        )?;

        debug!(token = %token, objects = objects.len(), "validated sample record");
        Ok(SampleRecord {
            token,
            objects,
            ego,
        })
    }
}

fn build_agent(
    index: usize,
    name: String,
    bbox: &[f64],
    offsets: &[f64],
    mask: &[f64],
) -> Result<Agent> {
    let bbox: [f64; 7] = to_array(&format!("gt_boxes[{index}]"), bbox)?;
    check_len(
        &format!("gt_agent_fut_trajs[{index}]"),
        offsets.len(),
        FUTURE_STEPS * 2,
    )?;
    check_len(
        &format!("gt_agent_fut_masks[{index}]"),
        mask.len(),
        FUTURE_STEPS,
    )?;

    let mut rel_future_offsets = [Point2::zeros(); FUTURE_STEPS];
    for (slot, pair) in rel_future_offsets.iter_mut().zip(offsets.chunks_exact(2)) {
        *slot = Point2::new(pair[0], pair[1]);
    }
    let mut future_valid = [false; FUTURE_STEPS];
    for (slot, &m) in future_valid.iter_mut().zip(mask) {
        *slot = m > 0.0;
    }

    Ok(Agent {
        name,
        bbox,
        rel_future_offsets,
        future_valid,
    })
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(ReasoningError::data_invariant(format!(
            "`{field}` has {actual} entries, expected {expected}"
        )))
    }
}

fn to_array<T: Copy, const N: usize>(field: &str, values: &[T]) -> Result<[T; N]> {
    values.try_into().map_err(|_| {
        ReasoningError::data_invariant(format!(
            "`{field}` has {} entries, expected {N}",
            values.len()
        ))
    })
}

/// Validate every sample of an externally loaded cache.
///
/// # Errors
///
/// Fails on the first malformed record; invariant violations are fatal.
pub fn validate_store(raw: HashMap<String, RawSample>) -> Result<SampleStore> {
    raw.into_iter()
        .map(|(token, sample)| {
            let record = sample.into_record(token.clone())?;
            Ok((token, record))
        })
        .collect()
}

/// Parse and validate a JSON object mapping tokens to raw samples.
///
/// # Errors
///
/// Returns [`ReasoningError::Json`] for malformed JSON and
/// [`ReasoningError::DataInvariant`] for malformed records.
pub fn store_from_json(json: &str) -> Result<SampleStore> {
    let raw: HashMap<String, RawSample> = serde_json::from_str(json)?;
    validate_store(raw)
}
