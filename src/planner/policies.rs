use super::types::{Observation, SubGoal, SubGoalKind};
use crate::error::BrainError;
use crate::kernel::label::TaskKind;

/// Pure planner: (TaskKind, Observation) -> fixed-order sub-goal template.
///
/// Only env_state pose lookups vary the output. The image and robot_state are
/// never consulted, so identical env_state always yields identical plans.
pub fn plan(kind: TaskKind, obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    match kind {
        TaskKind::Cleaning => cleaning(obs),
        TaskKind::Cooking => cooking(obs),
        TaskKind::Dishwashing => dishwashing(obs),
        TaskKind::Laundry => laundry(obs),
        TaskKind::Organizing => organizing(obs),
    }
}

fn cleaning(obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    Ok(vec![
        SubGoal::new(SubGoalKind::Move, "dirty_surface", obs.env_pose("dirty_surface_pose")?),
        SubGoal::new(SubGoalKind::Wipe, "dirty_surface", None).param("passes", 3),
        SubGoal::new(SubGoalKind::Place, "cleaning_tool_station", obs.env_pose("tool_station_pose")?),
    ])
}

fn cooking(obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    Ok(vec![
        SubGoal::new(SubGoalKind::Move, "prep_counter", obs.env_pose("prep_counter_pose")?),
        SubGoal::new(SubGoalKind::Grasp, "ingredient", None).param("tool", "gripper"),
        SubGoal::new(SubGoalKind::Place, "cutting_board", obs.env_pose("cutting_board_pose")?),
    ])
}

fn dishwashing(obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    Ok(vec![
        SubGoal::new(SubGoalKind::Move, "sink", obs.env_pose("sink_pose")?).param("speed", "normal"),
        SubGoal::new(SubGoalKind::Grasp, "plate", None).param("grasp_mode", "top"),
        SubGoal::new(SubGoalKind::Move, "dishwasher_rack", obs.env_pose("dishwasher_rack_pose")?)
            .param("speed", "slow"),
        SubGoal::new(SubGoalKind::Place, "dishwasher_slot", None).param("orientation", "upright"),
    ])
}

fn laundry(obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    Ok(vec![
        SubGoal::new(SubGoalKind::Move, "laundry_basket", obs.env_pose("basket_pose")?),
        SubGoal::new(SubGoalKind::Grasp, "garment", None).param("grasp_mode", "pinch"),
        SubGoal::new(SubGoalKind::Place, "fold_table", obs.env_pose("fold_table_pose")?),
    ])
}

fn organizing(obs: &Observation<'_>) -> Result<Vec<SubGoal>, BrainError> {
    Ok(vec![
        SubGoal::new(SubGoalKind::Grasp, "misplaced_item", None),
        SubGoal::new(SubGoalKind::Move, "storage_area", obs.env_pose("storage_pose")?),
        SubGoal::new(SubGoalKind::Place, "storage_bin", None).param("order", "category"),
    ])
}
