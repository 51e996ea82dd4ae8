// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod app;
pub mod commands;
pub mod config;
pub mod presets;
pub mod render;

pub use app::App;
