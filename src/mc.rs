// Copyright (c) 2022-2024, The blockpred contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Motion-compensated (inter) prediction.
//!
//! A predicted block is produced by separable fractional-pixel convolution
//! over a reference window: a horizontal pass, a vertical pass, or both,
//! selected per axis by the degeneracy of the supplied kernel. Degenerate
//! axes collapse to cheaper paths (2-tap bilinear, plain copy) that remain
//! bit-exact with the full 8-tap computation.

pub use self::rust::*;

use crate::cpu_features::CpuFeatureLevel;
use crate::frame::*;
use crate::util::*;

use std::ops;

/// Motion vector in eighth-pel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionVector {
  pub row: i16,
  pub col: i16,
}

impl MotionVector {
  #[inline]
  pub const fn quantize_to_fullpel(self) -> Self {
    Self { row: (self.row / 8) * 8, col: (self.col / 8) * 8 }
  }

  #[inline]
  pub const fn is_zero(self) -> bool {
    self.row == 0 && self.col == 0
  }

  /// The fractional part of the vector as `(x, y)` 1/16-pel phases.
  ///
  /// The phases index the 16-entry filter banks via [`subpel_filter`];
  /// eighth-pel vectors land on the even phases.
  #[inline]
  pub const fn subpel_phase(self) -> (usize, usize) {
    (((self.col & 7) << 1) as usize, ((self.row & 7) << 1) as usize)
  }
}

impl ops::Mul<i16> for MotionVector {
  type Output = MotionVector;

  #[inline]
  fn mul(self, rhs: i16) -> MotionVector {
    MotionVector { row: self.row * rhs, col: self.col * rhs }
  }
}

impl ops::Mul<u16> for MotionVector {
  type Output = MotionVector;

  #[inline]
  fn mul(self, rhs: u16) -> MotionVector {
    MotionVector { row: self.row * rhs as i16, col: self.col * rhs as i16 }
  }
}

impl ops::Shr<u8> for MotionVector {
  type Output = MotionVector;

  #[inline]
  fn shr(self, rhs: u8) -> MotionVector {
    MotionVector { row: self.row >> rhs, col: self.col >> rhs }
  }
}

impl ops::Shl<u8> for MotionVector {
  type Output = MotionVector;

  #[inline]
  fn shl(self, rhs: u8) -> MotionVector {
    MotionVector { row: self.row << rhs, col: self.col << rhs }
  }
}

impl ops::Add<MotionVector> for MotionVector {
  type Output = MotionVector;

  #[inline]
  fn add(self, rhs: MotionVector) -> MotionVector {
    MotionVector { row: self.row + rhs.row, col: self.col + rhs.col }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd)]
pub enum FilterMode {
  REGULAR = 0,
  SMOOTH = 1,
  SHARP = 2,
  BILINEAR = 3,
}

/// Filter precision: coefficients of every kernel sum to `1 << FILTER_BITS`.
pub const FILTER_BITS: usize = 7;
pub const SUBPEL_FILTER_SIZE: usize = 8;
/// Number of fractional-pixel phases per axis.
pub const SUBPEL_SHIFTS: usize = 16;

pub type SubpelKernel = [i32; SUBPEL_FILTER_SIZE];

/// The phase-0 kernel of every 8-tap bank: passes the center sample through.
pub const IDENTITY_KERNEL: SubpelKernel =
  [0, 0, 0, 1 << FILTER_BITS, 0, 0, 0, 0];

// The 2-tap bilinear bank is stored in 8-tap slots, centered on tap
// indices 3 and 4, so every kernel is addressed uniformly.
const SUBPEL_FILTERS: [[SubpelKernel; SUBPEL_SHIFTS]; 4] = [
  // REGULAR, Lagrangian interpolation
  [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [0, 1, -5, 126, 8, -3, 1, 0],
    [-1, 3, -10, 122, 18, -6, 2, 0],
    [-1, 4, -13, 118, 27, -9, 3, -1],
    [-1, 4, -16, 112, 37, -11, 4, -1],
    [-1, 5, -18, 105, 48, -14, 4, -1],
    [-1, 5, -19, 97, 58, -16, 5, -1],
    [-1, 6, -19, 88, 68, -18, 5, -1],
    [-1, 6, -19, 78, 78, -19, 6, -1],
    [-1, 5, -18, 68, 88, -19, 6, -1],
    [-1, 5, -16, 58, 97, -19, 5, -1],
    [-1, 4, -14, 48, 105, -18, 5, -1],
    [-1, 4, -11, 37, 112, -16, 4, -1],
    [-1, 3, -9, 27, 118, -13, 4, -1],
    [0, 2, -6, 18, 122, -10, 3, -1],
    [0, 1, -3, 8, 126, -5, 1, 0],
  ],
  // SMOOTH, 8-tap lowpass (Hamming window)
  [
    [-1, -7, 32, 80, 32, -7, -1, 0],
    [-1, -8, 28, 80, 37, -7, -2, 1],
    [0, -8, 24, 79, 41, -7, -2, 1],
    [0, -8, 20, 78, 45, -5, -3, 1],
    [0, -8, 16, 76, 50, -4, -3, 1],
    [0, -7, 13, 74, 54, -3, -4, 1],
    [1, -7, 9, 71, 58, -1, -4, 1],
    [1, -6, 6, 68, 62, 1, -5, 1],
    [1, -6, 4, 65, 65, 4, -6, 1],
    [1, -5, 1, 62, 68, 6, -6, 1],
    [1, -4, -1, 58, 71, 9, -7, 1],
    [1, -4, -3, 54, 74, 13, -7, 0],
    [1, -3, -4, 50, 76, 16, -8, 0],
    [1, -3, -5, 45, 78, 20, -8, 0],
    [1, -2, -7, 41, 79, 24, -8, 0],
    [1, -2, -7, 37, 80, 28, -8, -1],
  ],
  // SHARP, DCT based
  [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [-1, 3, -7, 127, 8, -3, 1, 0],
    [-2, 5, -13, 125, 17, -6, 3, -1],
    [-3, 7, -17, 121, 27, -10, 5, -2],
    [-4, 9, -20, 115, 37, -13, 6, -2],
    [-4, 10, -23, 108, 48, -16, 8, -3],
    [-4, 10, -24, 100, 59, -19, 9, -3],
    [-4, 11, -24, 90, 70, -21, 10, -4],
    [-4, 11, -23, 80, 80, -23, 11, -4],
    [-4, 10, -21, 70, 90, -24, 11, -4],
    [-3, 9, -19, 59, 100, -24, 10, -4],
    [-3, 8, -16, 48, 108, -23, 10, -4],
    [-2, 6, -13, 37, 115, -20, 9, -4],
    [-2, 5, -10, 27, 121, -17, 7, -3],
    [-1, 3, -6, 17, 125, -13, 5, -2],
    [0, 1, -3, 8, 127, -7, 3, -1],
  ],
  // BILINEAR
  [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [0, 0, 0, 120, 8, 0, 0, 0],
    [0, 0, 0, 112, 16, 0, 0, 0],
    [0, 0, 0, 104, 24, 0, 0, 0],
    [0, 0, 0, 96, 32, 0, 0, 0],
    [0, 0, 0, 88, 40, 0, 0, 0],
    [0, 0, 0, 80, 48, 0, 0, 0],
    [0, 0, 0, 72, 56, 0, 0, 0],
    [0, 0, 0, 64, 64, 0, 0, 0],
    [0, 0, 0, 56, 72, 0, 0, 0],
    [0, 0, 0, 48, 80, 0, 0, 0],
    [0, 0, 0, 40, 88, 0, 0, 0],
    [0, 0, 0, 32, 96, 0, 0, 0],
    [0, 0, 0, 24, 104, 0, 0, 0],
    [0, 0, 0, 16, 112, 0, 0, 0],
    [0, 0, 0, 8, 120, 0, 0, 0],
  ],
];

/// Looks up the kernel for a filter bank and a 1/16-pel phase.
#[inline]
pub fn subpel_filter(mode: FilterMode, phase: usize) -> &'static SubpelKernel {
  &SUBPEL_FILTERS[mode as usize][phase & (SUBPEL_SHIFTS - 1)]
}

pub(crate) mod rust {
  use super::*;
  use num_traits::*;

  /// Per-axis degeneracy of a (kernel, step) pair.
  #[derive(Copy, Clone, Debug, PartialEq, Eq)]
  enum FilterClass {
    /// Unit step and identity kernel: the axis is a stride translation.
    Copy,
    /// Only the two center taps are nonzero.
    Bilinear,
    FullTap,
  }

  fn classify(filter: &SubpelKernel, step_q4: usize) -> FilterClass {
    if step_q4 == 16 && *filter == IDENTITY_KERNEL {
      FilterClass::Copy
    } else if filter[..3] == [0; 3] && filter[5..] == [0; 3] {
      FilterClass::Bilinear
    } else {
      FilterClass::FullTap
    }
  }

  /// Returns the nonzero tap window of a kernel and how far it extends
  /// before the sampling position.
  fn kernel_window(
    filter: &SubpelKernel, class: FilterClass,
  ) -> (&[i32], usize) {
    if class == FilterClass::Bilinear {
      (&filter[3..5], 0)
    } else {
      (&filter[..], SUBPEL_FILTER_SIZE / 2 - 1)
    }
  }

  unsafe fn run_filter<T: AsPrimitive<i32>>(
    src: *const T, stride: usize, filter: &[i32],
  ) -> i32 {
    filter
      .iter()
      .enumerate()
      .map(|(i, f)| {
        let p = src.add(i * stride);
        f * (*p).as_()
      })
      .sum::<i32>()
  }

  /// Final store shared by the plain and blending variants: saturate, then
  /// either overwrite the destination or round-average into it.
  #[inline(always)]
  fn store<T: Pixel, const AVG: bool>(
    px: &mut T, val: i32, max_sample_val: i32,
  ) {
    let v = val.clamp(0, max_sample_val);
    if AVG {
      let cur: i32 = (*px).into();
      *px = T::cast_from((cur + v + 1) >> 1);
    } else {
      *px = T::cast_from(v);
    }
  }

  /// Scalar convolution over a reference window.
  ///
  /// `W` is a compile-time width the sized dispatch variants are
  /// monomorphized on; `W == 0` means the width is only known at runtime.
  /// All variants share this loop nest, so they agree bit for bit.
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn convolve<T: Pixel, const W: usize, const AVG: bool>(
    dst: &mut PlaneRegionMut<'_, T>, src: PlaneSlice<'_, T>, width: usize,
    height: usize, x_filter: &SubpelKernel, step_x_q4: usize,
    y_filter: &SubpelKernel, step_y_q4: usize, bit_depth: usize,
  ) {
    debug_assert!(W == 0 || W == width);
    assert!(width > 0 && height > 0);
    assert!(step_x_q4 > 0 && step_y_q4 > 0);
    let width = if W == 0 { width } else { W };

    let ref_stride = src.plane.cfg.stride;
    let max_sample_val = (1 << bit_depth) - 1;
    let intermediate_bits = 4 - if bit_depth == 12 { 2 } else { 0 };
    let x_class = classify(x_filter, step_x_q4);
    let y_class = classify(y_filter, step_y_q4);

    match (x_class, y_class) {
      (FilterClass::Copy, FilterClass::Copy) => {
        if AVG {
          for r in 0..height {
            let src_slice = &src[r];
            let dst_slice = &mut dst[r];
            for c in 0..width {
              store::<T, true>(
                &mut dst_slice[c],
                src_slice[c].into(),
                max_sample_val,
              );
            }
          }
        } else {
          for r in 0..height {
            let src_slice = &src[r];
            let dst_slice = &mut dst[r];
            dst_slice[..width].copy_from_slice(&src_slice[..width]);
          }
        }
      }
      (_, FilterClass::Copy) => {
        let (x_kernel, x_extend) = kernel_window(x_filter, x_class);
        let offset_slice = src.go_left(x_extend);
        for r in 0..height {
          let src_slice = &offset_slice[r];
          let dst_slice = &mut dst[r];
          for c in 0..width {
            let sc = (c * step_x_q4) >> 4;
            // SAFETY: We pass this a raw pointer, but it's created from a
            // checked slice, so we are safe.
            let sum =
              unsafe { run_filter(src_slice[sc..].as_ptr(), 1, x_kernel) };
            store::<T, AVG>(
              &mut dst_slice[c],
              round_shift(sum, FILTER_BITS),
              max_sample_val,
            );
          }
        }
      }
      (FilterClass::Copy, _) => {
        let (y_kernel, y_extend) = kernel_window(y_filter, y_class);
        let offset_slice = src.go_up(y_extend);
        for r in 0..height {
          let src_slice = &offset_slice[(r * step_y_q4) >> 4];
          let dst_slice = &mut dst[r];
          for c in 0..width {
            // SAFETY: We pass this a raw pointer, but it's created from a
            // checked slice, so we are safe.
            let sum = unsafe {
              run_filter(src_slice[c..].as_ptr(), ref_stride, y_kernel)
            };
            store::<T, AVG>(
              &mut dst_slice[c],
              round_shift(sum, FILTER_BITS),
              max_sample_val,
            );
          }
        }
      }
      (_, _) => {
        let (x_kernel, x_extend) = kernel_window(x_filter, x_class);
        let (y_kernel, y_extend) = kernel_window(y_filter, y_class);

        // The horizontal pass keeps `intermediate_bits` of extra precision
        // in an i16 buffer; the vertical pass removes them with its own
        // rounding, so the chained result matches the one-shot separable
        // filter.
        let intermediate_height =
          (((height - 1) * step_y_q4) >> 4) + y_kernel.len();

        // The stack buffer covers every dispatcher-specialized size;
        // taller vertical footprints spill to a heap buffer so the
        // generic path stays total.
        let mut intermediate: Aligned<[i16; 8 * (128 + 7)]> =
          Aligned::new([0; 8 * (128 + 7)]);
        let mut spill: Vec<i16> = Vec::new();
        let buf: &mut [i16] = if intermediate_height <= 128 + 7 {
          &mut intermediate.data[..]
        } else {
          spill.resize(8 * intermediate_height, 0);
          &mut spill[..]
        };

        let offset_slice = src.go_left(x_extend).go_up(y_extend);
        for cg in (0..width).step_by(8) {
          for r in 0..intermediate_height {
            let src_slice = &offset_slice[r];
            for c in cg..(cg + 8).min(width) {
              let sc = (c * step_x_q4) >> 4;
              // SAFETY: We pass this a raw pointer, but it's created from a
              // checked slice, so we are safe.
              let sum =
                unsafe { run_filter(src_slice[sc..].as_ptr(), 1, x_kernel) };
              buf[8 * r + (c - cg)] =
                round_shift(sum, FILTER_BITS - intermediate_bits) as i16;
            }
          }

          for r in 0..height {
            let dst_slice = &mut dst[r];
            let ri = (r * step_y_q4) >> 4;
            for c in cg..(cg + 8).min(width) {
              // SAFETY: We pass this a raw pointer, but it's created from a
              // checked slice, so we are safe.
              let sum = unsafe {
                run_filter(buf[8 * ri + c - cg..].as_ptr(), 8, y_kernel)
              };
              store::<T, AVG>(
                &mut dst_slice[c],
                round_shift(sum, FILTER_BITS + intermediate_bits),
                max_sample_val,
              );
            }
          }
        }
      }
    }
  }

  /// Produces a motion-compensated prediction into `dst`.
  ///
  /// `src` points at the block origin inside the reference window; the
  /// window must additionally cover the tap extension of each
  /// non-degenerate axis. With `blend` set, the result is round-averaged
  /// into the samples already present in `dst` instead of replacing them.
  ///
  /// Widths 4/8/16/32/64 route to kernels monomorphized on the width; any
  /// other size takes the generic path with identical output.
  #[allow(clippy::too_many_arguments)]
  pub fn predict_inter<T: Pixel>(
    dst: &mut PlaneRegionMut<'_, T>, src: PlaneSlice<'_, T>, width: usize,
    height: usize, x_filter: &SubpelKernel, step_x_q4: usize,
    y_filter: &SubpelKernel, step_y_q4: usize, blend: bool,
    bit_depth: usize, _cpu: CpuFeatureLevel,
  ) {
    macro_rules! dispatch {
      ($avg:literal) => {
        match width {
          4 => convolve::<T, 4, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
          8 => convolve::<T, 8, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
          16 => convolve::<T, 16, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
          32 => convolve::<T, 32, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
          64 => convolve::<T, 64, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
          _ => convolve::<T, 0, $avg>(
            dst, src, width, height, x_filter, step_x_q4, y_filter,
            step_y_q4, bit_depth,
          ),
        }
      };
    }
    if blend {
      dispatch!(true)
    } else {
      dispatch!(false)
    }
  }

  /// Round-averages a second predictor into `dst` in place.
  ///
  /// `dst = (dst + src + 1) >> 1` per sample. Both inputs are already
  /// saturated, so the sum cannot overflow.
  pub fn blend_average<T: Pixel>(
    dst: &mut PlaneRegionMut<'_, T>, src: &PlaneRegion<'_, T>, width: usize,
    height: usize, _cpu: CpuFeatureLevel,
  ) {
    for r in 0..height {
      let src_slice = &src[r];
      let dst_slice = &mut dst[r];
      for c in 0..width {
        let a: i32 = dst_slice[c].into();
        let b: i32 = src_slice[c].into();
        dst_slice[c] = T::cast_from((a + b + 1) >> 1);
      }
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::frame::{Plane, PlaneOffset, Rect};
  use pretty_assertions::assert_eq;
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaChaRng;

  const BIT_DEPTH: usize = 8;

  fn random_plane(rng: &mut ChaChaRng, width: usize, height: usize) -> Plane<u8> {
    let mut plane = Plane::new(width, height, 16, 16);
    for v in plane.data.iter_mut() {
      *v = rng.gen::<u8>();
    }
    plane
  }

  // Straight reimplementation of the convolution laws with the full 8-tap
  // window on every non-copy axis. The 2-tap and sized fast paths must
  // agree with this sample for sample.
  #[allow(clippy::too_many_arguments)]
  fn naive_convolve(
    src: &Plane<u8>, po: PlaneOffset, width: usize, height: usize,
    x_filter: &SubpelKernel, step_x_q4: usize, y_filter: &SubpelKernel,
    step_y_q4: usize,
  ) -> Vec<u8> {
    let get = |x: isize, y: isize| -> i32 {
      let row = (src.cfg.yorigin as isize + po.y + y) as usize;
      let col = (src.cfg.xorigin as isize + po.x + x) as usize;
      src.data[row * src.cfg.stride + col] as i32
    };
    let x_copy = step_x_q4 == 16 && *x_filter == IDENTITY_KERNEL;
    let y_copy = step_y_q4 == 16 && *y_filter == IDENTITY_KERNEL;
    let ib = 4;
    let mut out = vec![0u8; width * height];

    for r in 0..height {
      for c in 0..width {
        let sc = ((c * step_x_q4) >> 4) as isize;
        let sr = ((r * step_y_q4) >> 4) as isize;
        let val = match (x_copy, y_copy) {
          (true, true) => get(sc, sr),
          (false, true) => {
            let sum: i32 = (0..8)
              .map(|i| x_filter[i] * get(sc - 3 + i as isize, sr))
              .sum();
            round_shift(sum, FILTER_BITS).clamp(0, 255)
          }
          (true, false) => {
            let sum: i32 = (0..8)
              .map(|i| y_filter[i] * get(sc, sr - 3 + i as isize))
              .sum();
            round_shift(sum, FILTER_BITS).clamp(0, 255)
          }
          (false, false) => {
            let mut columns = [0i32; 8];
            for (i, col) in columns.iter_mut().enumerate() {
              let hsum: i32 = (0..8)
                .map(|j| {
                  x_filter[j] * get(sc - 3 + j as isize, sr - 3 + i as isize)
                })
                .sum();
              *col = round_shift(hsum, FILTER_BITS - ib);
            }
            let vsum: i32 =
              (0..8).map(|i| y_filter[i] * columns[i]).sum();
            round_shift(vsum, FILTER_BITS + ib).clamp(0, 255)
          }
        };
        out[r * width + c] = val as u8;
      }
    }
    out
  }

  #[test]
  fn convolve_matches_naive_reference() {
    let mut rng = ChaChaRng::from_seed([0; 32]);
    let src = random_plane(&mut rng, 90, 90);
    let po = PlaneOffset { x: 8, y: 8 };

    for &mode in &[
      FilterMode::REGULAR,
      FilterMode::SMOOTH,
      FilterMode::SHARP,
      FilterMode::BILINEAR,
    ] {
      for &(width, height) in
        &[(4, 4), (8, 8), (8, 4), (16, 16), (32, 32), (64, 64), (6, 6)]
      {
        for _ in 0..8 {
          let x_filter = subpel_filter(mode, rng.gen_range(0..16));
          let y_filter = subpel_filter(mode, rng.gen_range(0..16));
          let expected = naive_convolve(
            &src, po, width, height, x_filter, 16, y_filter, 16,
          );

          let mut dst = Plane::new(width, height, 0, 0);
          predict_inter(
            &mut dst.as_region_mut(),
            src.slice(po),
            width,
            height,
            x_filter,
            16,
            y_filter,
            16,
            false,
            BIT_DEPTH,
            CpuFeatureLevel::default(),
          );

          for r in 0..height {
            for c in 0..width {
              assert_eq!(
                dst.p(c, r),
                expected[r * width + c],
                "mode {:?} {}x{} at ({}, {})",
                mode,
                width,
                height,
                c,
                r
              );
            }
          }
        }
      }
    }
  }

  #[test]
  fn sized_kernels_match_generic() {
    let mut rng = ChaChaRng::from_seed([1; 32]);
    // Large enough that the tap extension stays inside the allocation
    // at step 24 for the 64-wide block.
    let src = random_plane(&mut rng, 128, 128);
    let po = PlaneOffset { x: 8, y: 8 };

    for &width in &[4usize, 8, 16, 32, 64] {
      let height = width;
      for &mode in &[FilterMode::REGULAR, FilterMode::SHARP] {
        for &blend in &[false, true] {
          for &step in &[16usize, 24] {
            let x_filter = subpel_filter(mode, rng.gen_range(0..16));
            let y_filter = subpel_filter(mode, rng.gen_range(0..16));

            let mut dst_sized = Plane::new(width, height, 0, 0);
            let mut dst_generic = dst_sized.clone();

            predict_inter(
              &mut dst_sized.as_region_mut(),
              src.slice(po),
              width,
              height,
              x_filter,
              step,
              y_filter,
              step,
              blend,
              BIT_DEPTH,
              CpuFeatureLevel::default(),
            );
            if blend {
              rust::convolve::<u8, 0, true>(
                &mut dst_generic.as_region_mut(),
                src.slice(po),
                width,
                height,
                x_filter,
                step,
                y_filter,
                step,
                BIT_DEPTH,
              );
            } else {
              rust::convolve::<u8, 0, false>(
                &mut dst_generic.as_region_mut(),
                src.slice(po),
                width,
                height,
                x_filter,
                step,
                y_filter,
                step,
                BIT_DEPTH,
              );
            }

            assert_eq!(&dst_sized.data[..], &dst_generic.data[..]);
          }
        }
      }
    }
  }

  #[test]
  fn two_pass_covers_tall_footprints() {
    // Blocks taller than the stack intermediate and large vertical steps
    // must still run the generic path to completion.
    let mut rng = ChaChaRng::from_seed([7; 32]);
    let src = random_plane(&mut rng, 160, 160);
    let po = PlaneOffset { x: 8, y: 8 };
    let x_filter = subpel_filter(FilterMode::REGULAR, 5);
    let y_filter = subpel_filter(FilterMode::REGULAR, 11);

    for &(width, height, step_y_q4) in
      &[(8usize, 140usize, 16usize), (64, 64, 40)]
    {
      let expected = naive_convolve(
        &src, po, width, height, x_filter, 16, y_filter, step_y_q4,
      );

      let mut dst = Plane::new(width, height, 0, 0);
      predict_inter(
        &mut dst.as_region_mut(),
        src.slice(po),
        width,
        height,
        x_filter,
        16,
        y_filter,
        step_y_q4,
        false,
        BIT_DEPTH,
        CpuFeatureLevel::default(),
      );

      for r in 0..height {
        for c in 0..width {
          assert_eq!(
            dst.p(c, r),
            expected[r * width + c],
            "{}x{} step_y {} at ({}, {})",
            width,
            height,
            step_y_q4,
            c,
            r
          );
        }
      }
    }
  }

  #[test]
  fn copy_degeneracy() {
    let mut rng = ChaChaRng::from_seed([2; 32]);
    let src = random_plane(&mut rng, 40, 40);
    let po = PlaneOffset { x: 5, y: 7 };
    let (width, height) = (16, 8);

    let mut dst = Plane::new(width, height, 0, 0);
    predict_inter(
      &mut dst.as_region_mut(),
      src.slice(po),
      width,
      height,
      &IDENTITY_KERNEL,
      16,
      &IDENTITY_KERNEL,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );

    for r in 0..height {
      for c in 0..width {
        assert_eq!(dst.p(c, r), src.p(c + 5, r + 7));
      }
    }
  }

  #[test]
  fn constant_window_invariant_under_any_kernel() {
    // Every kernel is normalized, so a flat window must stay flat through
    // any pass structure, including the extended-precision two-pass chain.
    let mut plane = Plane::<u8>::new(64, 64, 16, 16);
    for v in plane.data.iter_mut() {
      *v = 100;
    }
    let po = PlaneOffset { x: 8, y: 8 };

    for &mode in &[
      FilterMode::REGULAR,
      FilterMode::SMOOTH,
      FilterMode::SHARP,
      FilterMode::BILINEAR,
    ] {
      for phase in 0..16 {
        let filter = subpel_filter(mode, phase);
        let mut dst = Plane::new(8, 8, 0, 0);
        predict_inter(
          &mut dst.as_region_mut(),
          plane.slice(po),
          8,
          8,
          filter,
          16,
          filter,
          16,
          false,
          BIT_DEPTH,
          CpuFeatureLevel::default(),
        );
        for r in 0..8 {
          for c in 0..8 {
            assert_eq!(dst.p(c, r), 100, "mode {:?} phase {}", mode, phase);
          }
        }
      }
    }
  }

  #[test]
  fn single_tap_kernel_shifts_by_one() {
    // 1 << FILTER_BITS at tap index 4 reads the sample one past the
    // nominal position.
    let mut rng = ChaChaRng::from_seed([3; 32]);
    let src = random_plane(&mut rng, 40, 40);
    let po = PlaneOffset { x: 8, y: 8 };
    let shifted: SubpelKernel = [0, 0, 0, 0, 1 << FILTER_BITS, 0, 0, 0];

    let mut dst = Plane::new(8, 8, 0, 0);
    predict_inter(
      &mut dst.as_region_mut(),
      src.slice(po),
      8,
      8,
      &shifted,
      16,
      &IDENTITY_KERNEL,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );

    for r in 0..8 {
      for c in 0..8 {
        assert_eq!(dst.p(c, r), src.p(c + 8 + 1, r + 8));
      }
    }
  }

  #[test]
  fn saturation_clamps_instead_of_wrapping() {
    let filter = *subpel_filter(FilterMode::REGULAR, 8);

    // All taps at 255: the weighted sum overshoots and must pin at 255.
    let mut white = Plane::<u8>::new(32, 32, 16, 16);
    for v in white.data.iter_mut() {
      *v = 255;
    }
    let mut dst = Plane::new(4, 4, 0, 0);
    predict_inter(
      &mut dst.as_region_mut(),
      white.slice(PlaneOffset { x: 8, y: 8 }),
      4,
      4,
      &filter,
      16,
      &IDENTITY_KERNEL,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );
    for r in 0..4 {
      for c in 0..4 {
        assert_eq!(dst.p(c, r), 255);
      }
    }

    // 255 under the negative taps only: the sum goes below zero and must
    // pin at 0. Window for output column 0 covers plane columns 5..13.
    let mut plane = Plane::<u8>::new(32, 32, 16, 16);
    for v in plane.data.iter_mut() {
      *v = 0;
    }
    for (i, &coeff) in filter.iter().enumerate() {
      if coeff < 0 {
        for y in 0..32 {
          let idx = (plane.cfg.yorigin + y) * plane.cfg.stride
            + plane.cfg.xorigin
            + 5
            + i;
          plane.data[idx] = 255;
        }
      }
    }
    let mut dst = Plane::new(4, 4, 0, 0);
    predict_inter(
      &mut dst.as_region_mut(),
      plane.slice(PlaneOffset { x: 8, y: 8 }),
      4,
      4,
      &filter,
      16,
      &IDENTITY_KERNEL,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );
    assert_eq!(dst.p(0, 0), 0);
  }

  #[test]
  fn blend_with_itself_is_identity() {
    let mut rng = ChaChaRng::from_seed([4; 32]);
    let src = random_plane(&mut rng, 40, 40);
    let po = PlaneOffset { x: 8, y: 8 };
    let filter = subpel_filter(FilterMode::REGULAR, 5);

    let mut first = Plane::new(8, 8, 0, 0);
    predict_inter(
      &mut first.as_region_mut(),
      src.slice(po),
      8,
      8,
      filter,
      16,
      filter,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );

    // Blending the same prediction on top must change nothing.
    let mut blended = first.clone();
    predict_inter(
      &mut blended.as_region_mut(),
      src.slice(po),
      8,
      8,
      filter,
      16,
      filter,
      16,
      true,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );
    assert_eq!(&first.data[..], &blended.data[..]);

    // Same property through the standalone blend stage.
    let snapshot = first.clone();
    blend_average(
      &mut first.as_region_mut(),
      &snapshot.as_region(),
      8,
      8,
      CpuFeatureLevel::default(),
    );
    assert_eq!(&first.data[..], &snapshot.data[..]);
  }

  #[test]
  fn double_step_decimates() {
    let mut rng = ChaChaRng::from_seed([5; 32]);
    let src = random_plane(&mut rng, 64, 64);
    let po = PlaneOffset { x: 4, y: 4 };

    let mut dst = Plane::new(8, 8, 0, 0);
    predict_inter(
      &mut dst.as_region_mut(),
      src.slice(po),
      8,
      8,
      &IDENTITY_KERNEL,
      32,
      &IDENTITY_KERNEL,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );

    for r in 0..8 {
      for c in 0..8 {
        assert_eq!(dst.p(c, r), src.p(4 + 2 * c, 4 + r));
      }
    }
  }

  #[test]
  fn output_independent_of_destination_alignment() {
    let mut rng = ChaChaRng::from_seed([6; 32]);
    let src = random_plane(&mut rng, 64, 64);
    let po = PlaneOffset { x: 8, y: 8 };
    let x_filter = subpel_filter(FilterMode::SHARP, 3);
    let y_filter = subpel_filter(FilterMode::SHARP, 11);

    let mut baseline = Plane::new(16, 16, 0, 0);
    predict_inter(
      &mut baseline.as_region_mut(),
      src.slice(po),
      16,
      16,
      x_filter,
      16,
      y_filter,
      16,
      false,
      BIT_DEPTH,
      CpuFeatureLevel::default(),
    );

    for xoff in 1..8isize {
      let mut wide = Plane::new(64, 32, 0, 0);
      {
        let mut region = wide
          .region_mut(Rect { x: xoff, y: 2, width: 16, height: 16 });
        predict_inter(
          &mut region,
          src.slice(po),
          16,
          16,
          x_filter,
          16,
          y_filter,
          16,
          false,
          BIT_DEPTH,
          CpuFeatureLevel::default(),
        );
      }
      for r in 0..16usize {
        for c in 0..16usize {
          assert_eq!(
            wide.p(c + xoff as usize, r + 2),
            baseline.p(c, r),
            "offset {} at ({}, {})",
            xoff,
            c,
            r
          );
        }
      }
    }
  }

  #[test]
  fn all_kernels_are_normalized() {
    for bank in &SUBPEL_FILTERS {
      for kernel in bank {
        assert_eq!(kernel.iter().sum::<i32>(), 1 << FILTER_BITS);
      }
    }
  }

  #[test]
  fn motion_vector_ops() {
    let mv = MotionVector { row: 13, col: -9 };
    assert_eq!(
      mv.quantize_to_fullpel(),
      MotionVector { row: 8, col: -8 }
    );
    assert!(!mv.is_zero());
    assert!(MotionVector::default().is_zero());
    // row 13 & 7 = 5, col -9 & 7 = 7, doubled to sixteenth-pel phases.
    assert_eq!(mv.subpel_phase(), (14, 10));
    assert_eq!(mv.quantize_to_fullpel().subpel_phase(), (0, 0));
    assert_eq!(mv * 2u16, MotionVector { row: 26, col: -18 });
    assert_eq!(mv << 1, MotionVector { row: 26, col: -18 });
    assert_eq!((mv << 1) >> 1, mv);
    assert_eq!(mv + mv, mv * 2i16);
  }
}
