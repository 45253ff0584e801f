//! Integration tests for cooperative cancellation between steps.

use std::sync::Mutex;

use async_trait::async_trait;
use storefront_saga::{
    CancellationToken, Compensable, CompensableStep, SagaBuilder, SagaError, WorkflowContext,
};

struct TestHandle {
    token: CancellationToken,
    log: Mutex<Vec<String>>,
}

impl TestHandle {
    fn record(&self, entry: String) {
        self.log.lock().expect("lock poisoned").push(entry);
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().expect("lock poisoned").clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

struct CountStep {
    name: &'static str,
    cancel_after: bool,
}

#[async_trait]
impl CompensableStep for CountStep {
    type Input = u32;
    type Output = u32;
    type Compensation = u32;
    type Handle = TestHandle;
    type Error = TestError;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(
        &self,
        ctx: &WorkflowContext<Self::Handle>,
        input: Self::Input,
    ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error> {
        ctx.handle().record(format!("run {}", self.name));
        if self.cancel_after {
            ctx.handle().token.cancel();
        }
        Ok(Compensable::new(input + 1, input))
    }

    async fn compensate(
        &self,
        ctx: &WorkflowContext<Self::Handle>,
        previous: Self::Compensation,
    ) -> Result<(), Self::Error> {
        ctx.handle()
            .record(format!("undo {} to {previous}", self.name));
        Ok(())
    }
}

fn context(token: CancellationToken) -> WorkflowContext<TestHandle> {
    WorkflowContext::new(
        "tenant-a",
        TestHandle {
            token,
            log: Mutex::new(Vec::new()),
        },
    )
}

#[tokio::test]
async fn cancellation_stops_before_next_step_and_compensates() {
    let token = CancellationToken::new();
    let mut ctx = context(token.clone());

    let saga = SagaBuilder::new()
        .first_compensable(CountStep {
            name: "first",
            cancel_after: false,
        })
        .then_compensable(CountStep {
            name: "second",
            cancel_after: true,
        })
        .then_compensable(CountStep {
            name: "third",
            cancel_after: false,
        })
        .build();

    let err = saga
        .execute_cancellable(&mut ctx, 0, &token)
        .await
        .expect_err("saga was cancelled");

    match err {
        SagaError::Cancelled {
            ref next_step,
            ref compensation_errors,
        } => {
            assert_eq!(next_step, "third");
            assert!(compensation_errors.is_empty());
        }
        ref other => panic!("expected Cancelled, got {other:?}"),
    }
    assert_eq!(err.failed_step(), "third");
    assert!(err.step_error().is_none());
    assert_eq!(
        ctx.handle().log(),
        vec![
            "run first".to_string(),
            "run second".to_string(),
            "undo second to 1".to_string(),
            "undo first to 0".to_string(),
        ]
    );
    assert_eq!(ctx.completed_steps(), ["first", "second"]);
}

#[tokio::test]
async fn cancelled_before_start_runs_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let mut ctx = context(token.clone());

    let saga = SagaBuilder::new()
        .first_compensable(CountStep {
            name: "first",
            cancel_after: false,
        })
        .build();

    let err = saga
        .execute_cancellable(&mut ctx, 0, &token)
        .await
        .expect_err("saga was cancelled");

    assert!(matches!(err, SagaError::Cancelled { ref next_step, .. } if next_step == "first"));
    assert!(ctx.handle().log().is_empty());
}

#[tokio::test]
async fn cancelling_after_last_step_still_succeeds() -> anyhow::Result<()> {
    let token = CancellationToken::new();
    let mut ctx = context(token.clone());

    let saga = SagaBuilder::new()
        .first_compensable(CountStep {
            name: "only",
            cancel_after: true,
        })
        .build();

    let output = saga.execute_cancellable(&mut ctx, 7, &token).await?;

    assert_eq!(output, 8);
    assert_eq!(ctx.handle().log(), vec!["run only".to_string()]);
    Ok(())
}
