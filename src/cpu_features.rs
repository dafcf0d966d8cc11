// Copyright (c) 2022-2024, The blockpred contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use arg_enum_proc_macro::ArgEnum;

/// Selects the kernel strategy used by the prediction entry points.
///
/// Every level is bit-exact with `RUST`, the canonical scalar path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, ArgEnum, Default)]
pub enum CpuFeatureLevel {
  #[default]
  RUST,
}
