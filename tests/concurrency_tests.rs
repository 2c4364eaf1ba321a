mod common;

use common::{peaked, Harness};
use humanoid_brain::config::TASK_LABELS;
use humanoid_brain::kernel::label::{TaskKind, TaskLabel};
use humanoid_brain::kernel::telemetry::event::TelemetryEvent;
use humanoid_brain::planner::types::StateMap;
use humanoid_brain::vision::preprocess::{ImageInput, PixelBuffer};
use std::sync::Arc;

#[tokio::test]
async fn test_shared_brain_serves_concurrent_workers() {
    let h = Harness::new();
    let brain = Arc::new(h.brain(&TASK_LABELS, &peaked("cooking", 0.85), 0.6));

    // One blocking worker per call, as an embedding host would do.
    let mut workers = Vec::new();
    for i in 0..8u8 {
        let brain = brain.clone();
        workers.push(tokio::task::spawn_blocking(move || {
            let image: ImageInput = PixelBuffer::filled(16, 16, [i * 30, 100, 200]).into();
            brain.decide(&image, &StateMap::new(), &StateMap::new())
        }));
    }

    let mut decisions = Vec::new();
    for worker in workers {
        decisions.push(worker.await.unwrap().unwrap());
    }

    assert!(decisions.iter().all(|d| d.task == TaskLabel::Task(TaskKind::Cooking)));
    assert!(decisions.windows(2).all(|w| w[0].sub_goals == w[1].sub_goals));

    // Every record survived intact: 8 decisions, 8 plans, all parseable.
    let events = h.events();
    assert_eq!(events.len(), 16);
    let decisions_logged = events
        .iter()
        .filter(|e| matches!(e, TelemetryEvent::TaskDecision(_)))
        .count();
    assert_eq!(decisions_logged, 8);
}
