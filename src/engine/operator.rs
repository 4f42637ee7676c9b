// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operator descriptors: the closed set of stage kinds a pipeline is made of.
//!
//! Stage work is stored type-erased so a single pipeline can change event
//! type from stage to stage. The typed surface lives on
//! [`PipelineBuilder`](super::PipelineBuilder), which performs the
//! downcasts inside the closures it builds.

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::StateReader;

/// The event flowing between stages of one pipeline lineage.
///
/// Events are `Sync` so a reducer can borrow the event while the stage waits
/// for the reduce lock.
pub type Event = Box<dyn Any + Send + Sync>;

/// Single-value transform: consumes the event, may suspend, yields the next event.
pub type TransformOneWork<S> =
    Arc<dyn Fn(StateReader<S>, Event) -> BoxFuture<'static, anyhow::Result<Event>> + Send + Sync>;

/// Events produced by a multi-value transform. An `Err` item ends the lineage.
pub type EventStream = BoxStream<'static, anyhow::Result<Event>>;

/// Multi-value transform: consumes the event and yields a stream of events.
pub type TransformManyWork<S> =
    Arc<dyn Fn(StateReader<S>, Event) -> anyhow::Result<EventStream> + Send + Sync>;

/// Reducer: derives the next state from the prior state and the current event.
pub type ReduceWork<S> = Arc<dyn Fn(&S, &Event) -> anyhow::Result<S> + Send + Sync>;

/// Side effect: derives an optional value to post from the state and event.
pub type SideEffectWork<S, SE> =
    Arc<dyn Fn(&S, &Event) -> anyhow::Result<Option<SE>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    TransformOne,
    TransformMany,
    Reduce,
    SideEffect,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 4] = [
        OperatorKind::TransformOne,
        OperatorKind::TransformMany,
        OperatorKind::Reduce,
        OperatorKind::SideEffect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::TransformOne => "transform-one",
            OperatorKind::TransformMany => "transform-many",
            OperatorKind::Reduce => "reduce",
            OperatorKind::SideEffect => "side-effect",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage of a pipeline.
pub enum Operator<S, SE> {
    TransformOne {
        work: TransformOneWork<S>,
        idling_tracked: bool,
    },
    TransformMany {
        work: TransformManyWork<S>,
        idling_tracked: bool,
    },
    Reduce {
        work: ReduceWork<S>,
        idling_tracked: bool,
    },
    SideEffect {
        work: SideEffectWork<S, SE>,
        idling_tracked: bool,
    },
}

impl<S, SE> Operator<S, SE> {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::TransformOne { .. } => OperatorKind::TransformOne,
            Operator::TransformMany { .. } => OperatorKind::TransformMany,
            Operator::Reduce { .. } => OperatorKind::Reduce,
            Operator::SideEffect { .. } => OperatorKind::SideEffect,
        }
    }

    pub fn idling_tracked(&self) -> bool {
        match self {
            Operator::TransformOne { idling_tracked, .. }
            | Operator::TransformMany { idling_tracked, .. }
            | Operator::Reduce { idling_tracked, .. }
            | Operator::SideEffect { idling_tracked, .. } => *idling_tracked,
        }
    }
}

impl<S, SE> fmt::Debug for Operator<S, SE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("kind", &self.kind())
            .field("idling_tracked", &self.idling_tracked())
            .finish()
    }
}

/// Take ownership of a typed event, failing if an earlier stage produced another type.
pub(crate) fn downcast_event<E: 'static>(event: Event) -> anyhow::Result<E> {
    event
        .downcast::<E>()
        .map(|boxed| *boxed)
        .map_err(|_| anyhow::anyhow!("event is not a {}", std::any::type_name::<E>()))
}

/// Borrow a typed event.
pub(crate) fn event_ref<E: 'static>(event: &Event) -> anyhow::Result<&E> {
    event
        .downcast_ref::<E>()
        .ok_or_else(|| anyhow::anyhow!("event is not a {}", std::any::type_name::<E>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_have_stable_names() {
        let names: Vec<&str> = OperatorKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["transform-one", "transform-many", "reduce", "side-effect"]
        );
    }

    #[test]
    fn downcast_rejects_wrong_event_type() {
        let event: Event = Box::new(42_i32);
        let err = downcast_event::<String>(event).unwrap_err();
        assert!(err.to_string().contains("String"));

        let event: Event = Box::new(7_u8);
        assert_eq!(*event_ref::<u8>(&event).unwrap(), 7);
    }
}
