use crate::lab::LabKind;

pub mod drafts;

use drafts::{DraftKey, DraftSlot, DraftStore};

/// In-memory model of the active workspace: the selected kind and the text
/// of its editor slots. `testbench_text` carries no meaning for kinds
/// without a testbench slot and is omitted from execution requests there.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub kind: LabKind,
    pub design_text: String,
    pub testbench_text: String,
}

/// Opens the workspace for `kind`, seeding editor text from persisted
/// drafts when present. On the first visit (no design draft) both slots are
/// populated from the kind's default templates and the defaults are
/// persisted immediately, so a later reopen sees the same text even if the
/// user never edits.
pub fn open_workspace(kind: LabKind, store: &mut dyn DraftStore) -> Workspace {
    let design_key = DraftKey::new(kind, DraftSlot::Design);
    let tb_key = DraftKey::new(kind, DraftSlot::Testbench);

    if let Some(design_text) = store.get(&design_key) {
        let testbench_text = store.get(&tb_key).unwrap_or_default();
        return Workspace {
            kind,
            design_text,
            testbench_text,
        };
    }

    let design_text = kind.default_design().to_string();
    let testbench_text = kind.default_testbench().to_string();
    store.set(&design_key, &design_text);
    if kind.has_testbench() {
        store.set(&tb_key, &testbench_text);
    }

    Workspace {
        kind,
        design_text,
        testbench_text,
    }
}

/// Applies an edit to one slot: the in-memory workspace updates immediately
/// and the new text is written through to the draft store in the same call.
pub fn edit_slot(workspace: &mut Workspace, store: &mut dyn DraftStore, slot: DraftSlot, text: &str) {
    match slot {
        DraftSlot::Design => workspace.design_text = text.to_string(),
        DraftSlot::Testbench => workspace.testbench_text = text.to_string(),
    }
    store.set(&DraftKey::new(workspace.kind, slot), text);
}
