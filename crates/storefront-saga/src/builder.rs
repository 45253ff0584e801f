use std::fmt::Debug;
use std::marker::PhantomData;

use crate::erased::{CompensableWrapper, ErasedStep, StepWrapper};
use crate::saga::Saga;
use crate::step::{CompensableStep, SagaStep};

/// Builder state before any step was added.
pub struct Empty;

/// Builder state once at least one step was added; `Out` is what the last
/// step produces.
pub struct HasSteps<Out>(PhantomData<Out>);

/// Type-state builder for [`Saga`].
///
/// `In` is fixed by the first step, `Out` follows the last one, and every
/// appended step must take the previous step's output as its input. Only a
/// builder in the [`HasSteps`] state has `build`, so neither an empty saga
/// nor a broken chain can be constructed:
///
/// ```compile_fail
/// use async_trait::async_trait;
/// use storefront_saga::{Compensable, CompensableStep, SagaBuilder, SagaStep, WorkflowContext};
///
/// struct Reserve;
/// #[async_trait]
/// impl CompensableStep for Reserve {
///     type Input = u32;
///     type Output = String;
///     type Compensation = u32;
///     type Handle = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "reserve" }
///     async fn execute(
///         &self,
///         _: &WorkflowContext<()>,
///         qty: u32,
///     ) -> Result<Compensable<String, u32>, ()> {
///         Ok(Compensable::new(format!("hold-{qty}"), qty))
///     }
///     async fn compensate(&self, _: &WorkflowContext<()>, _: u32) -> Result<(), ()> {
///         Ok(())
///     }
/// }
///
/// struct Charge;
/// #[async_trait]
/// impl SagaStep for Charge {
///     type Input = u32;
///     type Output = u32;
///     type Handle = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "charge" }
///     async fn execute(&self, _: &WorkflowContext<()>, cents: u32) -> Result<u32, ()> {
///         Ok(cents)
///     }
/// }
///
/// // `Charge` takes a u32, but `Reserve` hands over a String.
/// let saga = SagaBuilder::new()
///     .first_compensable(Reserve)
///     .then(Charge)
///     .build();
/// ```
///
/// ```compile_fail
/// use storefront_saga::SagaBuilder;
///
/// let saga = SagaBuilder::<(), (), (), (), _>::new().build();
/// ```
pub struct SagaBuilder<In, Out, H, Err, State> {
    steps: Vec<Box<dyn ErasedStep<H, Err>>>,
    _state: PhantomData<(In, Out, State)>,
}

impl<H, Err> SagaBuilder<(), (), H, Err, Empty>
where
    H: Send + Sync,
    Err: Send,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Start with a step that has no compensation. Its input becomes the
    /// saga's input.
    #[must_use]
    pub fn first_step<S>(
        self,
        step: S,
    ) -> SagaBuilder<S::Input, S::Output, H, Err, HasSteps<S::Output>>
    where
        S: SagaStep<Handle = H, Error = Err> + 'static,
    {
        self.append(Box::new(StepWrapper::new(step)))
    }

    /// Start with a step that records compensation data.
    #[must_use]
    pub fn first_compensable<S>(
        self,
        step: S,
    ) -> SagaBuilder<S::Input, S::Output, H, Err, HasSteps<S::Output>>
    where
        S: CompensableStep<Handle = H, Error = Err> + 'static,
    {
        self.append(Box::new(CompensableWrapper::new(step)))
    }
}

impl<H, Err> Default for SagaBuilder<(), (), H, Err, Empty>
where
    H: Send + Sync,
    Err: Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out, H, Err, State> SagaBuilder<In, Out, H, Err, State> {
    fn append<NextIn, NextOut>(
        mut self,
        step: Box<dyn ErasedStep<H, Err>>,
    ) -> SagaBuilder<NextIn, NextOut, H, Err, HasSteps<NextOut>> {
        self.steps.push(step);
        SagaBuilder {
            steps: self.steps,
            _state: PhantomData,
        }
    }
}

impl<In, Out, H, Err> SagaBuilder<In, Out, H, Err, HasSteps<Out>>
where
    H: Send + Sync,
    Err: Send,
{
    /// Append a step without compensation that consumes the current output.
    #[must_use]
    pub fn then<S>(self, step: S) -> SagaBuilder<In, S::Output, H, Err, HasSteps<S::Output>>
    where
        S: SagaStep<Input = Out, Handle = H, Error = Err> + 'static,
    {
        self.append(Box::new(StepWrapper::new(step)))
    }

    /// Append a compensable step that consumes the current output.
    #[must_use]
    pub fn then_compensable<S>(
        self,
        step: S,
    ) -> SagaBuilder<In, S::Output, H, Err, HasSteps<S::Output>>
    where
        S: CompensableStep<Input = Out, Handle = H, Error = Err> + 'static,
    {
        self.append(Box::new(CompensableWrapper::new(step)))
    }

    #[must_use]
    pub fn build(self) -> Saga<In, Out, H, Err>
    where
        In: Send + 'static,
        Out: Send + 'static,
        Err: Debug,
    {
        Saga::from_steps(self.steps)
    }
}
