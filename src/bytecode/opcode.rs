//! JVM opcodes understood by the mutation engine.
//!
//! Only the opcodes that mutation operators inspect or emit, plus the common
//! ones a method body needs to round-trip, are modelled. Opcodes serialize as
//! their JVM mnemonic (`IADD`, `IF_ICMPLT`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opcodes {
    ($($variant:ident => $mnemonic:literal,)*) => {
        /// A JVM instruction opcode.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub enum Opcode {
            $(
                #[serde(rename = $mnemonic)]
                $variant,
            )*
        }

        impl Opcode {
            /// Every modelled opcode, in declaration order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// The JVM mnemonic for this opcode.
            pub const fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            /// Look an opcode up by its mnemonic.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
                match mnemonic {
                    $($mnemonic => Some(Opcode::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    Nop => "NOP",
    AconstNull => "ACONST_NULL",
    IconstM1 => "ICONST_M1",
    Iconst0 => "ICONST_0",
    Iconst1 => "ICONST_1",
    Iconst2 => "ICONST_2",
    Iconst3 => "ICONST_3",
    Iconst4 => "ICONST_4",
    Iconst5 => "ICONST_5",
    Lconst0 => "LCONST_0",
    Lconst1 => "LCONST_1",
    Fconst0 => "FCONST_0",
    Fconst1 => "FCONST_1",
    Fconst2 => "FCONST_2",
    Dconst0 => "DCONST_0",
    Dconst1 => "DCONST_1",
    Bipush => "BIPUSH",
    Sipush => "SIPUSH",
    Ldc => "LDC",
    Iload => "ILOAD",
    Lload => "LLOAD",
    Fload => "FLOAD",
    Dload => "DLOAD",
    Aload => "ALOAD",
    Iaload => "IALOAD",
    Aaload => "AALOAD",
    Istore => "ISTORE",
    Lstore => "LSTORE",
    Fstore => "FSTORE",
    Dstore => "DSTORE",
    Astore => "ASTORE",
    Iastore => "IASTORE",
    Aastore => "AASTORE",
    Pop => "POP",
    Pop2 => "POP2",
    Dup => "DUP",
    DupX1 => "DUP_X1",
    DupX2 => "DUP_X2",
    Dup2 => "DUP2",
    Dup2X1 => "DUP2_X1",
    Dup2X2 => "DUP2_X2",
    Swap => "SWAP",
    Iadd => "IADD",
    Ladd => "LADD",
    Fadd => "FADD",
    Dadd => "DADD",
    Isub => "ISUB",
    Lsub => "LSUB",
    Fsub => "FSUB",
    Dsub => "DSUB",
    Imul => "IMUL",
    Lmul => "LMUL",
    Fmul => "FMUL",
    Dmul => "DMUL",
    Idiv => "IDIV",
    Ldiv => "LDIV",
    Fdiv => "FDIV",
    Ddiv => "DDIV",
    Irem => "IREM",
    Lrem => "LREM",
    Frem => "FREM",
    Drem => "DREM",
    Ineg => "INEG",
    Lneg => "LNEG",
    Fneg => "FNEG",
    Dneg => "DNEG",
    Ishl => "ISHL",
    Lshl => "LSHL",
    Ishr => "ISHR",
    Lshr => "LSHR",
    Iushr => "IUSHR",
    Lushr => "LUSHR",
    Iand => "IAND",
    Land => "LAND",
    Ior => "IOR",
    Lor => "LOR",
    Ixor => "IXOR",
    Lxor => "LXOR",
    Iinc => "IINC",
    I2l => "I2L",
    I2f => "I2F",
    I2d => "I2D",
    L2i => "L2I",
    F2i => "F2I",
    D2i => "D2I",
    Lcmp => "LCMP",
    Fcmpl => "FCMPL",
    Fcmpg => "FCMPG",
    Dcmpl => "DCMPL",
    Dcmpg => "DCMPG",
    Ifeq => "IFEQ",
    Ifne => "IFNE",
    Iflt => "IFLT",
    Ifge => "IFGE",
    Ifgt => "IFGT",
    Ifle => "IFLE",
    IfIcmpeq => "IF_ICMPEQ",
    IfIcmpne => "IF_ICMPNE",
    IfIcmplt => "IF_ICMPLT",
    IfIcmpge => "IF_ICMPGE",
    IfIcmpgt => "IF_ICMPGT",
    IfIcmple => "IF_ICMPLE",
    IfAcmpeq => "IF_ACMPEQ",
    IfAcmpne => "IF_ACMPNE",
    Goto => "GOTO",
    Tableswitch => "TABLESWITCH",
    Lookupswitch => "LOOKUPSWITCH",
    Ireturn => "IRETURN",
    Lreturn => "LRETURN",
    Freturn => "FRETURN",
    Dreturn => "DRETURN",
    Areturn => "ARETURN",
    Return => "RETURN",
    Getstatic => "GETSTATIC",
    Putstatic => "PUTSTATIC",
    Getfield => "GETFIELD",
    Putfield => "PUTFIELD",
    Invokevirtual => "INVOKEVIRTUAL",
    Invokespecial => "INVOKESPECIAL",
    Invokestatic => "INVOKESTATIC",
    Invokeinterface => "INVOKEINTERFACE",
    New => "NEW",
    Anewarray => "ANEWARRAY",
    Arraylength => "ARRAYLENGTH",
    Athrow => "ATHROW",
    Checkcast => "CHECKCAST",
    Instanceof => "INSTANCEOF",
    Ifnull => "IFNULL",
    Ifnonnull => "IFNONNULL",
}

impl Opcode {
    /// Returns true for conditional and unconditional jumps that carry a label.
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Self::Ifeq
                | Self::Ifne
                | Self::Iflt
                | Self::Ifge
                | Self::Ifgt
                | Self::Ifle
                | Self::IfIcmpeq
                | Self::IfIcmpne
                | Self::IfIcmplt
                | Self::IfIcmpge
                | Self::IfIcmpgt
                | Self::IfIcmple
                | Self::IfAcmpeq
                | Self::IfAcmpne
                | Self::Goto
                | Self::Ifnull
                | Self::Ifnonnull
        )
    }

    /// Returns true for method invocation opcodes.
    pub fn is_invoke(self) -> bool {
        matches!(
            self,
            Self::Invokevirtual | Self::Invokespecial | Self::Invokestatic | Self::Invokeinterface
        )
    }

    /// Returns true for the value-returning and void return opcodes.
    pub fn is_return(self) -> bool {
        matches!(
            self,
            Self::Ireturn
                | Self::Lreturn
                | Self::Freturn
                | Self::Dreturn
                | Self::Areturn
                | Self::Return
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mnemonic_round_trip() {
        for &opcode in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
        assert_eq!(Opcode::from_mnemonic("BOGUS"), None);
    }

    #[test]
    fn test_serializes_as_mnemonic() {
        assert_eq!(
            serde_json::to_string(&Opcode::IfIcmplt).unwrap(),
            "\"IF_ICMPLT\""
        );
        assert_eq!(
            serde_json::from_str::<Opcode>("\"DUP2_X2\"").unwrap(),
            Opcode::Dup2X2
        );
    }

    #[test]
    fn test_classification() {
        assert!(Opcode::Ifeq.is_jump());
        assert!(Opcode::Goto.is_jump());
        assert!(!Opcode::Iadd.is_jump());
        assert!(Opcode::Invokestatic.is_invoke());
        assert!(Opcode::Areturn.is_return());
        assert!(!Opcode::Athrow.is_return());
    }
}
