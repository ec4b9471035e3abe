// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod builder;
pub mod scheduler;
pub mod sequencer;
pub mod submission;
