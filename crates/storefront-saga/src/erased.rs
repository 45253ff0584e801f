use std::any::Any;

use async_trait::async_trait;

use crate::context::WorkflowContext;
use crate::step::{CompensableStep, SagaStep};

pub(crate) type ErasedValue = Box<dyn Any + Send>;

/// Output of a type-erased step execution.
pub(crate) struct ErasedOutput {
    pub(crate) data: ErasedValue,
    /// `None` for steps that declare no compensation.
    pub(crate) compensation: Option<ErasedValue>,
}

#[async_trait]
pub(crate) trait ErasedStep<H, Err>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute_erased(
        &self,
        ctx: &WorkflowContext<H>,
        input: ErasedValue,
    ) -> Result<ErasedOutput, Err>;

    async fn compensate_erased(
        &self,
        ctx: &WorkflowContext<H>,
        compensation: ErasedValue,
    ) -> Result<(), Err>;

    fn compensation_description(&self) -> Option<String>;
}

pub(crate) struct StepWrapper<S> {
    step: S,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

#[async_trait]
impl<S> ErasedStep<S::Handle, S::Error> for StepWrapper<S>
where
    S: SagaStep,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    async fn execute_erased(
        &self,
        ctx: &WorkflowContext<S::Handle>,
        input: ErasedValue,
    ) -> Result<ErasedOutput, S::Error> {
        let typed_input = input
            .downcast::<S::Input>()
            .expect("type-state builder guarantees correct input type");
        let output = self.step.execute(ctx, *typed_input).await?;
        Ok(ErasedOutput {
            data: Box::new(output),
            compensation: None,
        })
    }

    async fn compensate_erased(
        &self,
        _ctx: &WorkflowContext<S::Handle>,
        _compensation: ErasedValue,
    ) -> Result<(), S::Error> {
        Ok(())
    }

    fn compensation_description(&self) -> Option<String> {
        None
    }
}

pub(crate) struct CompensableWrapper<S> {
    step: S,
}

impl<S> CompensableWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self { step }
    }
}

#[async_trait]
impl<S> ErasedStep<S::Handle, S::Error> for CompensableWrapper<S>
where
    S: CompensableStep,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    async fn execute_erased(
        &self,
        ctx: &WorkflowContext<S::Handle>,
        input: ErasedValue,
    ) -> Result<ErasedOutput, S::Error> {
        let typed_input = input
            .downcast::<S::Input>()
            .expect("type-state builder guarantees correct input type");
        let result = self.step.execute(ctx, *typed_input).await?;
        Ok(ErasedOutput {
            data: Box::new(result.data),
            compensation: Some(Box::new(result.compensation)),
        })
    }

    async fn compensate_erased(
        &self,
        ctx: &WorkflowContext<S::Handle>,
        compensation: ErasedValue,
    ) -> Result<(), S::Error> {
        let typed = compensation
            .downcast::<S::Compensation>()
            .expect("ledger only stores compensation data produced by this step");
        self.step.compensate(ctx, *typed).await
    }

    fn compensation_description(&self) -> Option<String> {
        Some(self.step.compensation_description())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::step::Compensable;

    struct TestHandle {
        multiplier: i32,
        log: Mutex<Vec<String>>,
    }

    #[derive(Debug, PartialEq)]
    struct TestError(String);

    struct MultiplyStep;

    #[async_trait]
    impl SagaStep for MultiplyStep {
        type Input = i32;
        type Output = i32;
        type Handle = TestHandle;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "multiply"
        }

        async fn execute(
            &self,
            ctx: &WorkflowContext<Self::Handle>,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input * ctx.handle().multiplier)
        }
    }

    struct ReserveStep;

    #[async_trait]
    impl CompensableStep for ReserveStep {
        type Input = i32;
        type Output = String;
        type Compensation = u64;
        type Handle = TestHandle;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "reserve"
        }

        async fn execute(
            &self,
            _ctx: &WorkflowContext<Self::Handle>,
            input: Self::Input,
        ) -> Result<Compensable<Self::Output, Self::Compensation>, Self::Error> {
            Ok(Compensable::new(format!("reserved {input}"), 99))
        }

        async fn compensate(
            &self,
            ctx: &WorkflowContext<Self::Handle>,
            compensation: Self::Compensation,
        ) -> Result<(), Self::Error> {
            ctx.handle()
                .log
                .lock()
                .expect("lock poisoned")
                .push(format!("release {compensation}"));
            Ok(())
        }
    }

    struct FailingStep;

    #[async_trait]
    impl SagaStep for FailingStep {
        type Input = String;
        type Output = ();
        type Handle = TestHandle;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "failing"
        }

        async fn execute(
            &self,
            _ctx: &WorkflowContext<Self::Handle>,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Err(TestError(input))
        }
    }

    fn context() -> WorkflowContext<TestHandle> {
        WorkflowContext::new(
            "tenant-a",
            TestHandle {
                multiplier: 3,
                log: Mutex::new(Vec::new()),
            },
        )
    }

    #[test]
    fn wrapper_delegates_name() {
        let wrapper = StepWrapper::new(MultiplyStep);
        assert_eq!(wrapper.name(), "multiply");
    }

    #[tokio::test]
    async fn plain_wrapper_executes_with_erased_types_and_no_compensation() {
        let ctx = context();
        let wrapper = StepWrapper::new(MultiplyStep);

        let output = wrapper
            .execute_erased(&ctx, Box::new(7_i32))
            .await
            .expect("execution should succeed");

        assert!(output.compensation.is_none());
        let value = output.data.downcast::<i32>().expect("output should be i32");
        assert_eq!(*value, 21);
        assert!(wrapper.compensation_description().is_none());
    }

    #[tokio::test]
    async fn compensable_wrapper_returns_compensation_data() {
        let ctx = context();
        let wrapper = CompensableWrapper::new(ReserveStep);

        let output = wrapper
            .execute_erased(&ctx, Box::new(5_i32))
            .await
            .expect("execution should succeed");

        let data = output.data.downcast::<String>().expect("output should be String");
        assert_eq!(*data, "reserved 5");
        let compensation = output.compensation.expect("compensation recorded");
        wrapper
            .compensate_erased(&ctx, compensation)
            .await
            .expect("compensation should succeed");
        assert_eq!(
            *ctx.handle().log.lock().expect("lock poisoned"),
            vec!["release 99".to_string()]
        );
    }

    #[test]
    fn compensable_wrapper_returns_default_description() {
        let wrapper = CompensableWrapper::new(ReserveStep);
        assert_eq!(
            wrapper.compensation_description(),
            Some("undo reserve".to_string())
        );
    }

    #[tokio::test]
    async fn wrapper_propagates_errors() {
        let ctx = context();
        let wrapper = StepWrapper::new(FailingStep);

        let result = wrapper
            .execute_erased(&ctx, Box::new(String::from("test error")))
            .await;

        let err = result.err().expect("should have an error");
        assert_eq!(err, TestError(String::from("test error")));
    }
}
