/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines progress reporting messages, sinks, and helper functions for the processing stages.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Progress reporting primitives for the processing pipeline.

use std::fmt::Debug;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Crop,
    Project,
    GeometricHeight,
    GravityCorrection,
    FieldSeparation,
    Gridding,
}

/// Progress events emitted while the pipeline runs.
#[derive(Debug, Clone)]
pub enum ProgressMsg {
    /// A stage has started.
    StageStarted { stage: Stage },

    /// A stage has completed.
    StageFinished { stage: Stage, elapsed: Duration },

    /// Event reporting how many observations survived cropping.
    PointsCropped { num_input: usize, num_kept: usize },

    /// Summary of an equivalent-source fit.
    FitSummary {
        label: String,
        num_data: usize,
        num_sources: usize,
        rms_misfit: f64,
        condition_estimate: f64,
    },

    /// Recoverable oddity in the input data.
    Warning { message: String },

    /// Arbitrary informational message.
    Message { message: String },
}

/// Sink that consumes progress messages.
pub trait ProgressSink: Send + Sync + Debug {
    fn emit(&self, msg: ProgressMsg);
}

/// Progress sink that forwards messages over a bounded channel.
///
/// Routine events are dropped while the buffer is full so a slow handler never
/// stalls the pipeline. Warnings wait for room and are always delivered.
#[derive(Debug)]
pub struct ClosureSink {
    tx: mpsc::SyncSender<ProgressMsg>,
}

impl ProgressSink for ClosureSink {
    #[inline]
    fn emit(&self, msg: ProgressMsg) {
        match msg {
            ProgressMsg::Warning { .. } => {
                let _ = self.tx.send(msg);
            }
            _ => {
                let _ = self.tx.try_send(msg);
            }
        }
    }
}

/// Spawns a listener thread that runs a handler closure for each progress message.
///
/// The listener exits once every clone of the returned sink has been dropped.
pub fn closure_sink<F>(
    buffer: usize,
    mut handler: F,
) -> (Arc<dyn ProgressSink>, thread::JoinHandle<()>)
where
    F: FnMut(ProgressMsg) + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<ProgressMsg>(buffer.max(1));
    let sink: Arc<dyn ProgressSink> = Arc::new(ClosureSink { tx });

    let handle = thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            handler(msg);
        }
    });

    (sink, handle)
}

/// Emits `msg` if a sink is attached.
#[inline]
pub(crate) fn emit(sink: &Option<Arc<dyn ProgressSink>>, msg: ProgressMsg) {
    if let Some(sink) = sink {
        sink.emit(msg);
    }
}
