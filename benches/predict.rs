// Copyright (c) 2022-2024, The blockpred contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use criterion::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use blockpred::{
  predict_intra, CpuFeatureLevel, IntraEdge, Plane, PredictionMode,
};

const BLOCK_SIZE: usize = 32;

fn generate_edge(ra: &mut ChaChaRng) -> (Vec<u8>, Vec<u8>, u8) {
  let above: Vec<u8> = (0..BLOCK_SIZE).map(|_| ra.gen()).collect();
  let left: Vec<u8> = (0..BLOCK_SIZE).map(|_| ra.gen()).collect();
  let top_left: u8 = ra.gen();

  (above, left, top_left)
}

fn bench_intra_mode(c: &mut Criterion, name: &str, mode: PredictionMode) {
  let mut ra = ChaChaRng::from_seed([0; 32]);
  let cpu = CpuFeatureLevel::default();
  let (above, left, top_left) = generate_edge(&mut ra);
  let edge = IntraEdge {
    above: &above,
    left: &left,
    top_left,
    has_above: true,
    has_left: true,
  };
  let mut dst = Plane::<u8>::new(BLOCK_SIZE, BLOCK_SIZE, 0, 0);

  c.bench_function(name, |b| {
    b.iter(|| {
      black_box(predict_intra(
        &mut dst.as_region_mut(),
        mode,
        &edge,
        BLOCK_SIZE,
        BLOCK_SIZE,
        8,
        cpu,
      ));
    })
  });
}

fn bench_predict_intra_dc(c: &mut Criterion) {
  bench_intra_mode(c, "predict_intra_dc_32x32", PredictionMode::DC_PRED);
}

fn bench_predict_intra_v(c: &mut Criterion) {
  bench_intra_mode(c, "predict_intra_v_32x32", PredictionMode::V_PRED);
}

fn bench_predict_intra_h(c: &mut Criterion) {
  bench_intra_mode(c, "predict_intra_h_32x32", PredictionMode::H_PRED);
}

fn bench_predict_intra_tm(c: &mut Criterion) {
  bench_intra_mode(c, "predict_intra_tm_32x32", PredictionMode::TM_PRED);
}

criterion_group!(
  predict,
  bench_predict_intra_dc,
  bench_predict_intra_v,
  bench_predict_intra_h,
  bench_predict_intra_tm,
);
