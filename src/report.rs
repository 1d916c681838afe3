//! Report pages: one per selected type.
//!
//! [`ReportAssembler`] turns a selected [`TypeDescriptor`] into a [`Page`] by running every
//! member through [`MemberFilter`] and [`SignatureFormatter`]. A page exists only if at least
//! one member line survived.

use std::fmt::{self, Write};

use log::info;

use crate::{
    descriptor::TypeDescriptor,
    filter::{Filters, MemberFilter},
    format::SignatureFormatter,
    token::Token,
};

/// The rendered report of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Simple name of the type, source of the output file name
    pub name: String,
    /// Full name of the type
    pub full_name: String,
    /// TypeDef token
    pub token: Token,
    /// Rendered method lines, `Method: {signature}, Token: 0x{HEX}`
    pub method_lines: Vec<String>,
    /// Rendered field lines, `{signature}, Token: 0x{HEX}`
    pub field_lines: Vec<String>,
}

impl Page {
    /// Number of methods that made it onto the page.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.method_lines.len()
    }

    /// Returns `true` if neither a method nor a field line survived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.method_lines.is_empty() && self.field_lines.is_empty()
    }

    /// The page text.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Class: {}", self.full_name)?;
        writeln!(f, "Token: 0x{:X}", self.token)?;
        writeln!(f)?;
        writeln!(f, "Methods:")?;
        writeln!(f, "=======")?;
        for line in &self.method_lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f)?;
        writeln!(f, "Fields:")?;
        writeln!(f, "=====")?;
        for line in &self.field_lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Composes pages from selected types.
pub struct ReportAssembler;

impl ReportAssembler {
    /// Builds the page of `ty`, or `None` when every member was filtered out.
    ///
    /// Each surviving line is logged at info level as it is produced. The caller is expected
    /// to have run the type through [`crate::TypeSelector`] first.
    #[must_use]
    pub fn assemble(ty: &TypeDescriptor, filters: &Filters) -> Option<Page> {
        let mut method_lines = Vec::new();
        for method in &ty.methods {
            if !MemberFilter::accepts_method(method, filters) {
                continue;
            }

            let mut line = String::from("Method: ");
            let _ = SignatureFormatter::write_method(&mut line, method);
            let _ = write!(line, ", Token: 0x{:X}", method.token);
            info!("{line}");
            method_lines.push(line);
        }

        let mut field_lines = Vec::new();
        for field in &ty.fields {
            if !MemberFilter::accepts_field(field) {
                continue;
            }

            let mut line = SignatureFormatter::field(field);
            let _ = write!(line, ", Token: 0x{:X}", field.token);
            info!("{line}");
            field_lines.push(line);
        }

        let page = Page {
            name: ty.name.clone(),
            full_name: ty.full_name.clone(),
            token: ty.token,
            method_lines,
            field_lines,
        };

        (!page.is_empty()).then_some(page)
    }
}
