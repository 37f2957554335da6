/// When a mutator runs relative to the delegate it wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOrder {
    Before,
    After,
}

type Delegate<P, R> = Box<dyn Fn(&P) -> R + Send + Sync>;
type Mutator<P> = Box<dyn Fn(&P) + Send + Sync>;

/// A delegate plus an optional mutator that updates the shared parameter on every iteration.
///
/// With `MutationOrder::After` the value returned is the one computed before the mutation.
pub struct Work<P, R> {
    delegate: Delegate<P, R>,
    mutator: Option<(Mutator<P>, MutationOrder)>,
}

impl<P, R> Work<P, R> {
    pub fn new<F>(delegate: F) -> Self
    where
        F: Fn(&P) -> R + Send + Sync + 'static,
    {
        Self {
            delegate: Box::new(delegate),
            mutator: None,
        }
    }

    pub fn mutate_before<M>(self, mutator: M) -> Self
    where
        M: Fn(&P) + Send + Sync + 'static,
    {
        self.with_mutator(mutator, MutationOrder::Before)
    }

    pub fn mutate_after<M>(self, mutator: M) -> Self
    where
        M: Fn(&P) + Send + Sync + 'static,
    {
        self.with_mutator(mutator, MutationOrder::After)
    }

    fn with_mutator<M>(mut self, mutator: M, order: MutationOrder) -> Self
    where
        M: Fn(&P) + Send + Sync + 'static,
    {
        self.mutator = Some((Box::new(mutator), order));
        self
    }

    pub fn mutation_order(&self) -> Option<MutationOrder> {
        self.mutator.as_ref().map(|(_, order)| *order)
    }

    /// Run one iteration
    pub fn invoke(&self, param: &P) -> R {
        match &self.mutator {
            None => (self.delegate)(param),
            Some((mutate, MutationOrder::Before)) => {
                mutate(param);
                (self.delegate)(param)
            }
            Some((mutate, MutationOrder::After)) => {
                let value = (self.delegate)(param);
                mutate(param);
                value
            }
        }
    }
}
