// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
// 'loader/file.rs' maps modules into memory, which needs unsafe

//! # typedump
//!
//! Dumps the types, methods and fields of a .NET module (typically a Unity game's
//! `Assembly-CSharp.dll`) into one plain-text page per type, with C#-style member signatures.
//! Modules are read directly from their ECMA-335 metadata; no .NET runtime is involved.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use typedump::{loader::CilProvider, Dumper, Filters};
//!
//! let dumper = Dumper::new(CilProvider::default(), "Parsed/Game");
//! let summary = dumper.run(
//!     Path::new("Game_Data/Managed/Assembly-CSharp.dll"),
//!     &Filters::new(Some("Player"), None),
//! )?;
//! println!(
//!     "{} methods in {} classes",
//!     summary.totals.methods, summary.totals.classes
//! );
//! # Ok::<(), typedump::Error>(())
//! ```
//!
//! A page looks like this:
//!
//! ```text
//! Class: Game.Player
//! Token: 0x2000002
//!
//! Methods:
//! =======
//! Method: public virtual void Move(float speed, out int steps), Token: 0x6000002
//!
//! Fields:
//! =====
//! public int health, Token: 0x4000001
//! ```
//!
//! ## Architecture
//!
//! - [`loader`] - [`loader::CilProvider`], the ECMA-335 reader producing descriptors
//! - [`descriptor`] - the runtime-agnostic type, method and field records
//! - [`filter`] - [`TypeSelector`] and [`MemberFilter`], the noise and substring filters
//! - [`format`] - [`SignatureFormatter`], C#-style rendering of members and type references
//! - [`report`] - [`ReportAssembler`], one [`Page`] per selected type
//! - [`writer`] - [`ReportWriter`], the concurrent fan-out of page writes
//! - [`dump`] - [`Dumper`], the pipeline tying all of the above together
//! - [`locate`] - finding a running game's managed folder
//!
//! Any source of descriptors can drive the pipeline by implementing [`MetadataProvider`].
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result). A module that loads only
//! partially is not an error: the types that failed are listed in
//! [`LoadedModule::diagnostics`], and a page that failed to write is listed in
//! [`DumpSummary::failed_writes`].
#[macro_use]
mod error;

pub mod descriptor;
pub mod diagnostics;
pub mod dump;
pub mod filter;
pub mod format;
pub mod loader;
pub mod locate;
pub mod provider;
pub mod report;
pub mod token;
pub mod writer;

/// `typedump` Result type
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub use descriptor::{
    Accessibility, FieldDescriptor, MethodDescriptor, MethodModifier, ParamDescriptor,
    TypeDescriptor, TypeKind, TypeName,
};
pub use dump::{DumpSummary, Dumper, RunTotals};
pub use filter::{Filters, MemberFilter, TypeSelector};
pub use format::SignatureFormatter;
pub use provider::{LoadedModule, MetadataProvider};
pub use report::{Page, ReportAssembler};
pub use token::Token;
pub use writer::ReportWriter;
