// Tests for sequential batch execution, failure isolation and cancellation

use crate::common::helpers::{PlanLog, jobs};
use ffspeed::engine::{
    BatchEvent, BatchRunner, BatchStatus, CancelToken, CommandPlan, EncoderProfile, Error,
    FfmpegTranscoder, JobSpec, Result, RunState, ThreadCount,
};
use std::path::PathBuf;

#[test]
fn test_failed_job_does_not_stop_batch() {
    let temp = tempfile::tempdir().unwrap();
    let log = PlanLog::default();
    let seen = log.clone();

    let transcoder = move |plan: &CommandPlan, job: &JobSpec| -> Result<()> {
        seen.record(plan);
        if job.source.ends_with("b.mp4") {
            return Err(Error::ProcessFailure {
                file: job.display_name(),
                message: "ffmpeg exited with exit status: 1".to_string(),
            });
        }
        Ok(())
    };

    let runner = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        transcoder,
    );

    let mut events = Vec::new();
    let outcome = runner
        .run(&jobs(&["/v/a.mp4", "/v/b.mp4", "/v/c.mp4"]), |e| {
            events.push(e)
        })
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Completed);
    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.total, 3);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 1);
    assert_eq!(outcome.failures[0].file, "b.mp4");
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(outcome.state(), RunState::FailedPartial);

    // Every job reached the transcoder, in order
    let plans = log.plans();
    assert_eq!(plans.len(), 3);
    for (plan, name) in plans.iter().zip(["a.mp4", "b.mp4", "c.mp4"]) {
        assert_eq!(plan[1], format!("/v/{}", name));
    }

    let failed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::JobFailed { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![1]);

    let completed: Vec<PathBuf> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::JobCompleted { output, .. } => Some(output.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        completed,
        vec![
            temp.path().join("a_2.0x.mp4"),
            temp.path().join("c_2.0x.mp4")
        ]
    );

    assert!(matches!(
        events.last(),
        Some(BatchEvent::Finished {
            status: BatchStatus::Completed,
            attempted: 3,
            total: 3,
            percent,
            message,
        }) if *percent == 100.0 && message == "Processing complete!"
    ));
}

#[test]
fn test_invalid_job_is_reported_and_skipped() {
    let temp = tempfile::tempdir().unwrap();
    let log = PlanLog::default();
    let seen = log.clone();
    let transcoder = move |plan: &CommandPlan, _: &JobSpec| -> Result<()> {
        seen.record(plan);
        Ok(())
    };

    let mut queue = jobs(&["/v/a.mp4", "/v/b.mp4"]);
    queue[0].speed = 0.0;

    let runner = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        transcoder,
    );
    let outcome = runner.run(&queue, |_| {}).unwrap();

    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].index, 0);
    assert!(outcome.failures[0].message.contains("speed"));
    assert_eq!(log.len(), 1);
}

#[test]
fn test_cancel_during_first_job() {
    let temp = tempfile::tempdir().unwrap();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let log = PlanLog::default();
    let seen = log.clone();

    // Cancel arrives while the first transcode is still running
    let transcoder = move |plan: &CommandPlan, _: &JobSpec| -> Result<()> {
        seen.record(plan);
        trigger.cancel();
        Ok(())
    };

    let runner = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        transcoder,
    )
    .with_cancel_token(cancel);

    let mut events = Vec::new();
    let outcome = runner
        .run(&jobs(&["/v/a.mp4", "/v/b.mp4", "/v/c.mp4"]), |e| {
            events.push(e)
        })
        .unwrap();

    assert_eq!(outcome.status, BatchStatus::Cancelled);
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.state(), RunState::Cancelled);
    assert_eq!(log.len(), 1);
    assert!(matches!(
        events.last(),
        Some(BatchEvent::Finished {
            status: BatchStatus::Cancelled,
            attempted: 1,
            percent,
            message,
            ..
        }) if *percent == 0.0 && message == "Processing stopped by user"
    ));
}

#[test]
fn test_spawned_batch_streams_events() {
    let temp = tempfile::tempdir().unwrap();
    let out_dir = temp.path().join("nested").join("out");
    let accept = |_: &CommandPlan, _: &JobSpec| -> Result<()> { Ok(()) };

    let handle = BatchRunner::new(&out_dir, EncoderProfile::Software, ThreadCount::Auto, accept)
        .spawn(jobs(&["/v/a.mp4", "/v/b.mp4"]))
        .unwrap();

    // Output folder is created before the thread starts
    assert!(out_dir.is_dir());

    let events: Vec<BatchEvent> = handle.events().iter().collect();
    let progress: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        progress,
        vec!["Processing a.mp4 (1/2)", "Processing b.mp4 (2/2)"]
    );

    let outcome = handle.wait().unwrap();
    assert_eq!(outcome.state(), RunState::Completed);
}

#[test]
fn test_spawn_rejects_empty_queue() {
    let temp = tempfile::tempdir().unwrap();
    let accept = |_: &CommandPlan, _: &JobSpec| -> Result<()> { Ok(()) };
    let result = BatchRunner::new(temp.path(), EncoderProfile::Software, ThreadCount::Auto, accept)
        .spawn(Vec::new());
    assert!(matches!(result, Err(Error::EmptyQueue)));
}

#[cfg(unix)]
#[test]
fn test_ffmpeg_transcoder_exit_status() {
    let temp = tempfile::tempdir().unwrap();
    let queue = jobs(&["/v/a.mp4"]);

    let ok = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        FfmpegTranscoder::new("true"),
    );
    let outcome = ok.run(&queue, |_| {}).unwrap();
    assert!(outcome.failures.is_empty());

    let failing = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        FfmpegTranscoder::new("false"),
    );
    let outcome = failing.run(&queue, |_| {}).unwrap();
    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].message.contains("Failed to process a.mp4"));
}

#[test]
fn test_missing_transcoder_is_process_failure() {
    let temp = tempfile::tempdir().unwrap();
    let runner = BatchRunner::new(
        temp.path(),
        EncoderProfile::Software,
        ThreadCount::Auto,
        FfmpegTranscoder::new("ffspeed-no-such-transcoder"),
    );

    let outcome = runner.run(&jobs(&["/v/a.mp4", "/v/b.mp4"]), |_| {}).unwrap();
    assert_eq!(outcome.status, BatchStatus::Completed);
    assert_eq!(outcome.failures.len(), 2);
    assert!(outcome.failures[0].message.contains("could not start"));
}

#[test]
fn test_output_named_when_each_job_starts() {
    let temp = tempfile::tempdir().unwrap();

    // Behaves like the real transcoder: the output file exists once the job ends
    let writer = |plan: &CommandPlan, _: &JobSpec| -> Result<()> {
        let output = plan.args().last().expect("plan ends with the output path");
        std::fs::write(output, b"frames")?;
        Ok(())
    };

    let runner = BatchRunner::new(temp.path(), EncoderProfile::Software, ThreadCount::Auto, writer);
    let mut outputs = Vec::new();
    let outcome = runner
        .run(&jobs(&["/a/clip.mp4", "/b/clip.mp4"]), |e| {
            if let BatchEvent::JobCompleted { output, .. } = e {
                outputs.push(output);
            }
        })
        .unwrap();

    assert!(outcome.failures.is_empty());
    assert_eq!(
        outputs,
        vec![
            temp.path().join("clip_2.0x.mp4"),
            temp.path().join("clip_2.0x_1.mp4")
        ]
    );
    assert!(outputs.iter().all(|path| path.is_file()));
}
