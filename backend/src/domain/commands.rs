//! Domain-level command types
//! These structs are used by services inside the domain layer. The gateway
//! layer is responsible for mapping them to the public DTOs defined in the
//! `shared` crate.

pub mod cell {
    use chrono::NaiveDate;
    use shared::{AttendanceStatus, ChildId};

    /// Which part of an anchor cell an edit touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum CellField {
        Status,
        Notes,
    }

    /// An editable cell. The column is always the grid's anchor date.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellRef {
        pub child_id: ChildId,
        pub field: CellField,
    }

    impl CellRef {
        pub fn status(child_id: ChildId) -> Self {
            Self {
                child_id,
                field: CellField::Status,
            }
        }

        pub fn notes(child_id: ChildId) -> Self {
            Self {
                child_id,
                field: CellField::Notes,
            }
        }
    }

    /// Value held by one field of a cell
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum CellValue {
        Status(AttendanceStatus),
        Notes(Option<String>),
    }

    impl CellValue {
        pub fn field(&self) -> CellField {
            match self {
                CellValue::Status(_) => CellField::Status,
                CellValue::Notes(_) => CellField::Notes,
            }
        }
    }

    /// An optimistic edit already applied to the grid.
    ///
    /// Rolling back restores `previous` and `previous_generation` if the grid
    /// is still the one the edit was made against (`epoch`) and no later edit
    /// has touched the cell since (`generation`). Restoring the generation
    /// hands the cell back to the edit underneath, if it is still pending.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct CellEdit {
        pub cell: CellRef,
        /// Anchor date at the time the edit was made
        pub date: NaiveDate,
        pub previous: CellValue,
        pub applied: CellValue,
        /// Cell generation this edit was made on top of
        pub previous_generation: u64,
        pub generation: u64,
        pub epoch: u64,
    }
}

pub mod bulk {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use shared::{BulkPresentRequest, ChildId, ClassId, WriteMetadata};

    /// Mark every currently unrecorded child present on the anchor date
    #[derive(Debug, Clone, PartialEq)]
    pub struct BulkPresentCommand {
        pub class_id: ClassId,
        pub date: NaiveDate,
        pub targets: BTreeSet<ChildId>,
        pub metadata: WriteMetadata,
    }

    impl BulkPresentCommand {
        pub fn to_request(&self) -> BulkPresentRequest {
            BulkPresentRequest {
                class_id: self.class_id.clone(),
                date: self.date,
                child_ids: self.targets.iter().copied().collect(),
                metadata: self.metadata.clone(),
            }
        }
    }
}
