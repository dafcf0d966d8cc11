// Copyright (c) 2022-2024, The blockpred contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Per-block sample prediction for VP9-class codecs.
//!
//! This crate implements the two prediction families a block-based decoder
//! or encoder needs to produce a predicted block:
//!
//! * inter prediction: separable fractional-pixel interpolation over a
//!   motion-compensated reference window ([`mc`]), with an optional
//!   compound blend against a second predictor already in the destination;
//! * intra prediction: DC, vertical, horizontal and TrueMotion fills from
//!   the reconstructed neighbors of the current block ([`predict`]).
//!
//! Every kernel variant (generic fallback, size-specialized, and any future
//! hardware-accelerated strategy behind [`cpu_features::CpuFeatureLevel`])
//! produces byte-identical output for identical input. The generic scalar
//! path is the canonical semantics the other variants are tested against.
//!
//! The engine holds no state between calls, performs no I/O and no heap
//! allocation on the hot path, and may be invoked concurrently on disjoint
//! destination blocks without synchronization.

pub mod cpu_features;
pub mod frame;
pub mod mc;
pub mod predict;
pub mod util;

pub use crate::cpu_features::CpuFeatureLevel;
pub use crate::frame::{
  Plane, PlaneOffset, PlaneRegion, PlaneRegionMut, PlaneSlice, Rect,
};
pub use crate::mc::{
  blend_average, predict_inter, subpel_filter, FilterMode, MotionVector,
};
pub use crate::predict::{predict_intra, IntraEdge, PredictionMode};
