//! Method, field and type signatures from the `#Blob` heap (ECMA-335 II.23.2).
//!
//! Signatures are decoded into a tree of [`TypeSignature`] nodes that still refer to the tables
//! by token; turning them into names is the resolver's job. Custom modifiers (`modreq`,
//! `modopt`) are skipped wherever they may occur, since they do not affect the rendered type.

use crate::{loader::parser::Parser, token::Token, Error::RecursionLimit, Result};

/// Nesting limit for type signatures.
pub const MAX_RECURSION_DEPTH: usize = 50;

/// `ELEMENT_TYPE_*` constants (ECMA-335 II.23.1.16).
#[allow(missing_docs, non_snake_case)]
pub mod ELEMENT_TYPE {
    pub const END: u8 = 0x00;
    pub const VOID: u8 = 0x01;
    pub const BOOLEAN: u8 = 0x02;
    pub const CHAR: u8 = 0x03;
    pub const I1: u8 = 0x04;
    pub const U1: u8 = 0x05;
    pub const I2: u8 = 0x06;
    pub const U2: u8 = 0x07;
    pub const I4: u8 = 0x08;
    pub const U4: u8 = 0x09;
    pub const I8: u8 = 0x0a;
    pub const U8: u8 = 0x0b;
    pub const R4: u8 = 0x0c;
    pub const R8: u8 = 0x0d;
    pub const STRING: u8 = 0x0e;
    pub const PTR: u8 = 0x0f;
    pub const BYREF: u8 = 0x10;
    pub const VALUETYPE: u8 = 0x11;
    pub const CLASS: u8 = 0x12;
    pub const VAR: u8 = 0x13;
    pub const ARRAY: u8 = 0x14;
    pub const GENERICINST: u8 = 0x15;
    pub const TYPEDBYREF: u8 = 0x16;
    pub const I: u8 = 0x18;
    pub const U: u8 = 0x19;
    pub const FNPTR: u8 = 0x1b;
    pub const OBJECT: u8 = 0x1c;
    pub const SZARRAY: u8 = 0x1d;
    pub const MVAR: u8 = 0x1e;
    pub const CMOD_REQD: u8 = 0x1f;
    pub const CMOD_OPT: u8 = 0x20;
    pub const SENTINEL: u8 = 0x41;
    pub const PINNED: u8 = 0x45;
}

/// A decoded type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TypeSignature {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    Ptr(Box<TypeSignature>),
    ByRef(Box<TypeSignature>),
    /// `TypeDef`, `TypeRef` or `TypeSpec` token
    ValueType(Token),
    /// `TypeDef`, `TypeRef` or `TypeSpec` token
    Class(Token),
    /// Generic parameter of the enclosing type, by position
    GenericParamType(u32),
    /// General array with its rank; sizes and bounds are not kept
    Array(Box<TypeSignature>, u32),
    /// Generic type instantiation
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
    TypedByRef,
    I,
    U,
    FnPtr(Box<SignatureMethod>),
    Object,
    SzArray(Box<TypeSignature>),
    /// Generic parameter of the enclosing method, by position
    GenericParamMethod(u32),
    Pinned(Box<TypeSignature>),
}

/// A parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameter {
    /// Passed by reference (`ref`, `out`, `in`)
    pub by_ref: bool,
    /// The parameter type, without the by-reference marker
    pub base: TypeSignature,
}

/// A `MethodDefSig` or `MethodRefSig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMethod {
    /// Instance method
    pub has_this: bool,
    /// `this` is passed explicitly as the first parameter
    pub explicit_this: bool,
    /// Vararg calling convention
    pub vararg: bool,
    /// Number of generic parameters, 0 for non-generic methods
    pub param_count_generic: u32,
    /// The return value
    pub return_type: SignatureParameter,
    /// Fixed parameters in declaration order
    pub params: Vec<SignatureParameter>,
}

/// A `FieldSig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureField {
    /// The field type
    pub base: TypeSignature,
}

/// Decoder for one signature blob.
pub struct SignatureParser<'a> {
    parser: Parser<'a>,
    depth: usize,
}

impl<'a> SignatureParser<'a> {
    /// Creates a parser over a signature blob.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        SignatureParser {
            parser: Parser::new(data),
            depth: 0,
        }
    }

    /// Parses a method signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an invalid calling convention or element type,
    /// [`crate::Error::OutOfBounds`] for truncated blobs and
    /// [`crate::Error::RecursionLimit`] for types nested too deeply.
    pub fn parse_method_signature(&mut self) -> Result<SignatureMethod> {
        let convention = self.parser.read_le::<u8>()?;
        if convention & 0x0F > 0x05 {
            return Err(malformed_error!(
                "SignatureMethod - invalid calling convention - {}",
                convention
            ));
        }

        let param_count_generic = if convention & 0x10 != 0 {
            self.parser.read_compressed_uint()?
        } else {
            0
        };
        let param_count = self.parser.read_compressed_uint()?;
        let return_type = self.parse_param()?;

        let mut params = Vec::with_capacity((param_count as usize).min(self.parser.remaining()));
        for _ in 0..param_count {
            if self.parser.peek_byte()? == ELEMENT_TYPE::SENTINEL {
                // Only the vararg tail follows
                break;
            }

            params.push(self.parse_param()?);
        }

        Ok(SignatureMethod {
            has_this: convention & 0x20 != 0,
            explicit_this: convention & 0x40 != 0,
            vararg: convention & 0x0F == 0x05,
            param_count_generic,
            return_type,
            params,
        })
    }

    /// Parses a field signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the blob does not start with `0x06`, plus the
    /// errors of [`SignatureParser::parse_method_signature`].
    pub fn parse_field_signature(&mut self) -> Result<SignatureField> {
        let head_byte = self.parser.read_le::<u8>()?;
        if head_byte != 0x06 {
            return Err(malformed_error!(
                "SignatureField - invalid start - {}",
                head_byte
            ));
        }

        Ok(SignatureField {
            base: self.parse_type()?,
        })
    }

    /// Parses a `TypeSpec` blob, which holds a single type.
    ///
    /// # Errors
    /// See [`SignatureParser::parse_method_signature`].
    pub fn parse_type_spec(&mut self) -> Result<TypeSignature> {
        self.parse_type()
    }

    fn parse_param(&mut self) -> Result<SignatureParameter> {
        self.skip_custom_mods()?;

        let mut by_ref = false;
        if self.parser.peek_byte()? == ELEMENT_TYPE::BYREF {
            self.parser.advance()?;
            by_ref = true;
        }

        Ok(SignatureParameter {
            by_ref,
            base: self.parse_type()?,
        })
    }

    fn skip_custom_mods(&mut self) -> Result<()> {
        while self.parser.has_more_data() {
            let next_byte = self.parser.peek_byte()?;
            if next_byte != ELEMENT_TYPE::CMOD_OPT && next_byte != ELEMENT_TYPE::CMOD_REQD {
                break;
            }

            self.parser.advance()?;
            self.parser.read_compressed_token()?;
        }

        Ok(())
    }

    fn parse_type(&mut self) -> Result<TypeSignature> {
        self.depth += 1;
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RecursionLimit(MAX_RECURSION_DEPTH));
        }

        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeSignature> {
        self.skip_custom_mods()?;

        let current_byte = self.parser.read_le::<u8>()?;
        match current_byte {
            ELEMENT_TYPE::VOID => Ok(TypeSignature::Void),
            ELEMENT_TYPE::BOOLEAN => Ok(TypeSignature::Boolean),
            ELEMENT_TYPE::CHAR => Ok(TypeSignature::Char),
            ELEMENT_TYPE::I1 => Ok(TypeSignature::I1),
            ELEMENT_TYPE::U1 => Ok(TypeSignature::U1),
            ELEMENT_TYPE::I2 => Ok(TypeSignature::I2),
            ELEMENT_TYPE::U2 => Ok(TypeSignature::U2),
            ELEMENT_TYPE::I4 => Ok(TypeSignature::I4),
            ELEMENT_TYPE::U4 => Ok(TypeSignature::U4),
            ELEMENT_TYPE::I8 => Ok(TypeSignature::I8),
            ELEMENT_TYPE::U8 => Ok(TypeSignature::U8),
            ELEMENT_TYPE::R4 => Ok(TypeSignature::R4),
            ELEMENT_TYPE::R8 => Ok(TypeSignature::R8),
            ELEMENT_TYPE::STRING => Ok(TypeSignature::String),
            ELEMENT_TYPE::PTR => Ok(TypeSignature::Ptr(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::BYREF => Ok(TypeSignature::ByRef(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::VALUETYPE => Ok(TypeSignature::ValueType(
                self.parser.read_compressed_token()?,
            )),
            ELEMENT_TYPE::CLASS => Ok(TypeSignature::Class(self.parser.read_compressed_token()?)),
            ELEMENT_TYPE::VAR => Ok(TypeSignature::GenericParamType(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::ARRAY => {
                let elem_type = self.parse_type()?;
                let rank = self.parser.read_compressed_uint()?;

                let num_sizes = self.parser.read_compressed_uint()?;
                for _ in 0..num_sizes {
                    self.parser.read_compressed_uint()?;
                }

                let num_lo_bounds = self.parser.read_compressed_uint()?;
                for _ in 0..num_lo_bounds {
                    // Lower bounds are signed compressed integers; same width rules
                    self.parser.read_compressed_uint()?;
                }

                Ok(TypeSignature::Array(Box::new(elem_type), rank))
            }
            ELEMENT_TYPE::GENERICINST => {
                let peek_byte = self.parser.peek_byte()?;
                if peek_byte != ELEMENT_TYPE::CLASS && peek_byte != ELEMENT_TYPE::VALUETYPE {
                    return Err(malformed_error!(
                        "GENERICINST - Next byte is not TYPE_CLASS or TYPE_VALUE - {}",
                        peek_byte
                    ));
                }

                let base_type = self.parse_type()?;
                let arg_count = self.parser.read_compressed_uint()?;

                let mut type_args =
                    Vec::with_capacity((arg_count as usize).min(self.parser.remaining()));
                for _ in 0..arg_count {
                    type_args.push(self.parse_type()?);
                }

                Ok(TypeSignature::GenericInst(Box::new(base_type), type_args))
            }
            ELEMENT_TYPE::TYPEDBYREF => Ok(TypeSignature::TypedByRef),
            ELEMENT_TYPE::I => Ok(TypeSignature::I),
            ELEMENT_TYPE::U => Ok(TypeSignature::U),
            ELEMENT_TYPE::FNPTR => Ok(TypeSignature::FnPtr(Box::new(
                self.parse_method_signature()?,
            ))),
            ELEMENT_TYPE::OBJECT => Ok(TypeSignature::Object),
            ELEMENT_TYPE::SZARRAY => Ok(TypeSignature::SzArray(Box::new(self.parse_type()?))),
            ELEMENT_TYPE::MVAR => Ok(TypeSignature::GenericParamMethod(
                self.parser.read_compressed_uint()?,
            )),
            ELEMENT_TYPE::PINNED => Ok(TypeSignature::Pinned(Box::new(self.parse_type()?))),
            _ => Err(malformed_error!(
                "Unsupported ELEMENT_TYPE - {}",
                current_byte
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn instance_method() {
        // instance void (int32, string)
        let data = [0x20, 0x02, 0x01, 0x08, 0x0E];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();

        assert!(method.has_this);
        assert!(!method.vararg);
        assert_eq!(method.param_count_generic, 0);
        assert_eq!(method.return_type.base, TypeSignature::Void);
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.params[0].base, TypeSignature::I4);
        assert_eq!(method.params[1].base, TypeSignature::String);
    }

    #[test]
    fn generic_method() {
        // !!0 Foo<T>(!!0)
        let data = [0x10, 0x01, 0x01, 0x1E, 0x00, 0x1E, 0x00];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();

        assert!(!method.has_this);
        assert_eq!(method.param_count_generic, 1);
        assert_eq!(method.return_type.base, TypeSignature::GenericParamMethod(0));
        assert_eq!(method.params[0].base, TypeSignature::GenericParamMethod(0));
    }

    #[test]
    fn byref_and_modifiers() {
        // void (ref int32, modreq(TypeRef 0x12) int32[])
        let data = [0x00, 0x02, 0x01, 0x10, 0x08, 0x1F, 0x49, 0x1D, 0x08];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();

        assert!(method.params[0].by_ref);
        assert_eq!(method.params[0].base, TypeSignature::I4);
        assert!(!method.params[1].by_ref);
        assert_eq!(
            method.params[1].base,
            TypeSignature::SzArray(Box::new(TypeSignature::I4))
        );
    }

    #[test]
    fn vararg_sentinel() {
        // vararg void (int32, ...)
        let data = [0x05, 0x02, 0x01, 0x08, 0x41, 0x0E];
        let method = SignatureParser::new(&data).parse_method_signature().unwrap();

        assert!(method.vararg);
        assert_eq!(method.params.len(), 1);
    }

    #[test]
    fn fields() {
        let field = SignatureParser::new(&[0x06, 0x0C])
            .parse_field_signature()
            .unwrap();
        assert_eq!(field.base, TypeSignature::R4);

        // List<int32> with TypeRef row 0x12
        let field = SignatureParser::new(&[0x06, 0x15, 0x12, 0x49, 0x01, 0x08])
            .parse_field_signature()
            .unwrap();
        assert_eq!(
            field.base,
            TypeSignature::GenericInst(
                Box::new(TypeSignature::Class(Token::new(0x0100_0012))),
                vec![TypeSignature::I4]
            )
        );

        // int32[,] with no sizes or bounds
        let field = SignatureParser::new(&[0x06, 0x14, 0x08, 0x02, 0x00, 0x00])
            .parse_field_signature()
            .unwrap();
        assert_eq!(
            field.base,
            TypeSignature::Array(Box::new(TypeSignature::I4), 2)
        );

        // modopt before the type
        let field = SignatureParser::new(&[0x06, 0x20, 0x49, 0x11, 0x08])
            .parse_field_signature()
            .unwrap();
        assert_eq!(field.base, TypeSignature::ValueType(Token::new(0x0200_0002)));

        assert!(SignatureParser::new(&[0x07, 0x08])
            .parse_field_signature()
            .is_err());
    }

    #[test]
    fn type_spec() {
        let spec = SignatureParser::new(&[0x1D, 0x13, 0x00])
            .parse_type_spec()
            .unwrap();
        assert_eq!(
            spec,
            TypeSignature::SzArray(Box::new(TypeSignature::GenericParamType(0)))
        );
    }

    #[test]
    fn function_pointer() {
        let data = [0x06, 0x1B, 0x00, 0x00, 0x01];
        let field = SignatureParser::new(&data).parse_field_signature().unwrap();
        assert!(matches!(field.base, TypeSignature::FnPtr(_)));
    }

    #[test]
    fn invalid() {
        assert!(matches!(
            SignatureParser::new(&[0x00, 0x01, 0x01, 0x17]).parse_method_signature(),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            SignatureParser::new(&[0x00, 0x02, 0x01, 0x08]).parse_method_signature(),
            Err(Error::OutOfBounds)
        ));
        assert!(SignatureParser::new(&[0x06, 0x15, 0x08])
            .parse_field_signature()
            .is_err());
        assert!(SignatureParser::new(&[0x0A, 0x00, 0x01])
            .parse_method_signature()
            .is_err());
    }

    #[test]
    fn recursion_limit() {
        let mut data = vec![0x06];
        data.extend(std::iter::repeat(0x1D).take(MAX_RECURSION_DEPTH + 5));
        data.push(0x08);

        assert!(matches!(
            SignatureParser::new(&data).parse_field_signature(),
            Err(Error::RecursionLimit(_))
        ));
    }

    #[test]
    fn depth_resets_between_params() {
        // Many shallow parameters stay well below the nesting limit
        let count = MAX_RECURSION_DEPTH * 2;
        let mut data = vec![0x00, count as u8, 0x01];
        for _ in 0..count {
            data.extend_from_slice(&[0x1D, 0x08]);
        }

        let method = SignatureParser::new(&data).parse_method_signature().unwrap();
        assert_eq!(method.params.len(), count);
    }
}
