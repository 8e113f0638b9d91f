use serde::{Deserialize, Serialize};

/// The three remote execution targets BitLab knows about. Each kind carries
/// its static lab configuration: display title, editor mode, whether a
/// testbench editor applies, and the seed templates for a fresh workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabKind {
    Verilog,
    Vhdl,
    Qnx,
}

pub const ALL_KINDS: [LabKind; 3] = [LabKind::Verilog, LabKind::Vhdl, LabKind::Qnx];

const VERILOG_DESIGN_TEMPLATE: &str = "// BitLab Verilog Template\nmodule main();\n  initial begin\n    $display(\"BitLab Logic Core: Ready\");\n  end\nendmodule";

const VERILOG_TB_TEMPLATE: &str =
    "// Verilog Testbench\nmodule testbench();\n  // Stimulus here\nendmodule";

const VHDL_DESIGN_TEMPLATE: &str = "-- BitLab VHDL Template\nlibrary IEEE;\nuse IEEE.STD_LOGIC_1164.ALL;\n\nentity main is\nend main;\n\narchitecture Behavioral of main is\nbegin\nend Behavioral;";

const VHDL_TB_TEMPLATE: &str = "-- VHDL Testbench\nlibrary IEEE;\nuse IEEE.STD_LOGIC_1164.ALL;";

const QNX_DESIGN_TEMPLATE: &str = "#include <stdio.h>\n\nint main() {\n  printf(\"Initializing BitLab QNX Engine...\\n\");\n  return 0;\n}";

impl LabKind {
    /// Wire identifier sent to the execution boundary, also the prefix of
    /// the draft storage keys.
    pub fn language_id(self) -> &'static str {
        match self {
            Self::Verilog => "verilog",
            Self::Vhdl => "vhdl",
            Self::Qnx => "qnx",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Verilog => "Verilog Core",
            Self::Vhdl => "VHDL Logic",
            Self::Qnx => "QNX Target",
        }
    }

    /// Syntax mode the editor surface should use for this kind.
    pub fn editor_mode(self) -> &'static str {
        match self {
            Self::Verilog => "verilog",
            Self::Vhdl => "vhdl",
            Self::Qnx => "cpp",
        }
    }

    /// QNX submissions are plain programs; only the HDL kinds carry a
    /// simulation stimulus editor.
    pub fn has_testbench(self) -> bool {
        !matches!(self, Self::Qnx)
    }

    pub fn default_design(self) -> &'static str {
        match self {
            Self::Verilog => VERILOG_DESIGN_TEMPLATE,
            Self::Vhdl => VHDL_DESIGN_TEMPLATE,
            Self::Qnx => QNX_DESIGN_TEMPLATE,
        }
    }

    pub fn default_testbench(self) -> &'static str {
        match self {
            Self::Verilog => VERILOG_TB_TEMPLATE,
            Self::Vhdl => VHDL_TB_TEMPLATE,
            Self::Qnx => "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hdl_kinds_have_testbench_slot_qnx_does_not() {
        assert!(LabKind::Verilog.has_testbench());
        assert!(LabKind::Vhdl.has_testbench());
        assert!(!LabKind::Qnx.has_testbench());
    }

    #[test]
    fn every_kind_seeds_a_design_template() {
        for kind in ALL_KINDS {
            assert!(!kind.default_design().is_empty(), "{}", kind.language_id());
        }
    }

    #[test]
    fn testbench_template_is_empty_exactly_when_slot_is_absent() {
        for kind in ALL_KINDS {
            assert_eq!(kind.has_testbench(), !kind.default_testbench().is_empty());
        }
    }
}
