// Copyright (c) 2022-2024, The blockpred contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Spatial (intra) prediction.
//!
//! A block is filled from its reconstructed neighbors: one row above, one
//! column to the left and the corner sample between them. The four modes
//! are a closed set; each call is stateless.

pub use self::rust::*;

use crate::cpu_features::CpuFeatureLevel;
use crate::frame::PlaneRegionMut;
use crate::util::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum PredictionMode {
  DC_PRED,
  V_PRED,
  H_PRED,
  TM_PRED,
}

/// Reconstructed neighbor samples of the block being predicted.
///
/// `above` must hold at least `width` samples and `left` at least `height`
/// when the corresponding availability flag is set. Callers must not select
/// V_PRED without `has_above` or H_PRED without `has_left`; DC_PRED
/// substitutes per-mode defaults when a neighbor set is missing.
pub struct IntraEdge<'a, T: Pixel> {
  pub above: &'a [T],
  pub left: &'a [T],
  pub top_left: T,
  pub has_above: bool,
  pub has_left: bool,
}

pub(crate) mod rust {
  use super::*;

  fn fill_block<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, width: usize, height: usize, val: T,
  ) {
    for line in output.rows_iter_mut().take(height) {
      for v in &mut line[..width] {
        *v = val;
      }
    }
  }

  fn sum_edge<T: Pixel>(edge: &[T]) -> u32 {
    edge.iter().fold(0u32, |acc, &v| {
      let v: u32 = v.into();
      acc + v
    })
  }

  pub fn pred_dc<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, above: &[T], left: &[T],
    width: usize, height: usize,
  ) {
    let len = (width + height) as u32;
    let sum = sum_edge(&left[..height]) + sum_edge(&above[..width]);
    let avg = T::cast_from((sum + (len >> 1)) / len);

    fill_block(output, width, height, avg);
  }

  pub fn pred_dc_128<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, width: usize, height: usize,
    bit_depth: usize,
  ) {
    let val = T::cast_from(128u32 << (bit_depth - 8));
    fill_block(output, width, height, val);
  }

  pub fn pred_dc_left<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, left: &[T], width: usize,
    height: usize,
  ) {
    let sum = sum_edge(&left[..height]);
    let avg = T::cast_from((sum + (height as u32 >> 1)) / height as u32);
    fill_block(output, width, height, avg);
  }

  pub fn pred_dc_top<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, above: &[T], width: usize,
    height: usize,
  ) {
    let sum = sum_edge(&above[..width]);
    let avg = T::cast_from((sum + (width as u32 >> 1)) / width as u32);
    fill_block(output, width, height, avg);
  }

  pub fn pred_v<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, above: &[T], width: usize,
    height: usize,
  ) {
    for line in output.rows_iter_mut().take(height) {
      line[..width].copy_from_slice(&above[..width]);
    }
  }

  pub fn pred_h<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, left: &[T], width: usize,
    height: usize,
  ) {
    for (line, l) in output.rows_iter_mut().zip(left[..height].iter()) {
      for v in &mut line[..width] {
        *v = *l;
      }
    }
  }

  pub fn pred_tm<T: Pixel>(
    output: &mut PlaneRegionMut<'_, T>, above: &[T], left: &[T],
    top_left: T, width: usize, height: usize, bit_depth: usize,
  ) {
    let max_sample_val = (1 << bit_depth) - 1;
    let base: i32 = top_left.into();

    for (line, l) in output.rows_iter_mut().zip(left[..height].iter()) {
      let l: i32 = (*l).into();
      for (v, a) in line[..width].iter_mut().zip(above[..width].iter()) {
        let a: i32 = (*a).into();
        *v = T::cast_from((a + l - base).clamp(0, max_sample_val));
      }
    }
  }
}

/// Size-specialized intra kernels.
///
/// Each method is monomorphized per block type; the defaults delegate to
/// the generic loops, which keeps every size bit-exact with the runtime
/// sized fallback.
pub trait Intra<T: Pixel>: Dim {
  fn pred_dc(output: &mut PlaneRegionMut<'_, T>, above: &[T], left: &[T]) {
    rust::pred_dc(output, above, left, Self::W, Self::H)
  }

  fn pred_dc_128(output: &mut PlaneRegionMut<'_, T>, bit_depth: usize) {
    rust::pred_dc_128(output, Self::W, Self::H, bit_depth)
  }

  fn pred_dc_left(output: &mut PlaneRegionMut<'_, T>, left: &[T]) {
    rust::pred_dc_left(output, left, Self::W, Self::H)
  }

  fn pred_dc_top(output: &mut PlaneRegionMut<'_, T>, above: &[T]) {
    rust::pred_dc_top(output, above, Self::W, Self::H)
  }

  fn pred_v(output: &mut PlaneRegionMut<'_, T>, above: &[T]) {
    rust::pred_v(output, above, Self::W, Self::H)
  }

  fn pred_h(output: &mut PlaneRegionMut<'_, T>, left: &[T]) {
    rust::pred_h(output, left, Self::W, Self::H)
  }

  fn pred_tm(
    output: &mut PlaneRegionMut<'_, T>, above: &[T], left: &[T],
    top_left: T, bit_depth: usize,
  ) {
    rust::pred_tm(output, above, left, top_left, Self::W, Self::H, bit_depth)
  }
}

impl<T: Pixel> Intra<T> for Block4x4 {}
impl<T: Pixel> Intra<T> for Block8x8 {}
impl<T: Pixel> Intra<T> for Block16x16 {}
impl<T: Pixel> Intra<T> for Block32x32 {}
impl<T: Pixel> Intra<T> for Block64x64 {}
impl<T: Pixel> Intra<T> for Block4x8 {}
impl<T: Pixel> Intra<T> for Block8x4 {}
impl<T: Pixel> Intra<T> for Block8x16 {}
impl<T: Pixel> Intra<T> for Block16x8 {}
impl<T: Pixel> Intra<T> for Block16x32 {}
impl<T: Pixel> Intra<T> for Block32x16 {}
impl<T: Pixel> Intra<T> for Block32x64 {}
impl<T: Pixel> Intra<T> for Block64x32 {}

/// Fills `dst` with an intra prediction from the supplied neighbor context.
///
/// Sizes with a declared block type run the size-specialized kernels; any
/// other size takes the generic path with identical output.
pub fn predict_intra<T: Pixel>(
  dst: &mut PlaneRegionMut<'_, T>, mode: PredictionMode,
  edge: &IntraEdge<'_, T>, width: usize, height: usize, bit_depth: usize,
  _cpu: CpuFeatureLevel,
) {
  macro_rules! predict_sized {
    ($b:ty) => {
      match mode {
        PredictionMode::DC_PRED => match (edge.has_above, edge.has_left) {
          (true, true) => {
            <$b as Intra<T>>::pred_dc(dst, edge.above, edge.left)
          }
          (true, false) => <$b as Intra<T>>::pred_dc_top(dst, edge.above),
          (false, true) => <$b as Intra<T>>::pred_dc_left(dst, edge.left),
          (false, false) => <$b as Intra<T>>::pred_dc_128(dst, bit_depth),
        },
        PredictionMode::V_PRED => <$b as Intra<T>>::pred_v(dst, edge.above),
        PredictionMode::H_PRED => <$b as Intra<T>>::pred_h(dst, edge.left),
        PredictionMode::TM_PRED => <$b as Intra<T>>::pred_tm(
          dst,
          edge.above,
          edge.left,
          edge.top_left,
          bit_depth,
        ),
      }
    };
  }

  match (width, height) {
    (4, 4) => predict_sized!(Block4x4),
    (8, 8) => predict_sized!(Block8x8),
    (16, 16) => predict_sized!(Block16x16),
    (32, 32) => predict_sized!(Block32x32),
    (64, 64) => predict_sized!(Block64x64),
    (4, 8) => predict_sized!(Block4x8),
    (8, 4) => predict_sized!(Block8x4),
    (8, 16) => predict_sized!(Block8x16),
    (16, 8) => predict_sized!(Block16x8),
    (16, 32) => predict_sized!(Block16x32),
    (32, 16) => predict_sized!(Block32x16),
    (32, 64) => predict_sized!(Block32x64),
    (64, 32) => predict_sized!(Block64x32),
    _ => match mode {
      PredictionMode::DC_PRED => match (edge.has_above, edge.has_left) {
        (true, true) => {
          rust::pred_dc(dst, edge.above, edge.left, width, height)
        }
        (true, false) => rust::pred_dc_top(dst, edge.above, width, height),
        (false, true) => rust::pred_dc_left(dst, edge.left, width, height),
        (false, false) => rust::pred_dc_128(dst, width, height, bit_depth),
      },
      PredictionMode::V_PRED => rust::pred_v(dst, edge.above, width, height),
      PredictionMode::H_PRED => rust::pred_h(dst, edge.left, width, height),
      PredictionMode::TM_PRED => rust::pred_tm(
        dst,
        edge.above,
        edge.left,
        edge.top_left,
        width,
        height,
        bit_depth,
      ),
    },
  }
}
