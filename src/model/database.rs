//! Database container objects: filegroups, data files, log files

use crate::compat::ObjectKind;
use crate::error::Result;
use crate::property::{LifecycleState, PropertyBag, PropertyType, TrackedObject};

/// Property names shared by data and log files.
pub mod file_names {
    pub const FILE_NAME: &str = "FileName";
    /// KB
    pub const SIZE: &str = "Size";
    /// KB; 0 or -1 means unlimited
    pub const MAX_SIZE: &str = "MaxSize";
    /// KB, or percent with `GrowthType = Percent`
    pub const GROWTH: &str = "Growth";
    pub const GROWTH_TYPE: &str = "GrowthType";
    pub const IS_PRIMARY_FILE: &str = "IsPrimaryFile";
}

/// Property names of a filegroup bag.
pub mod filegroup_names {
    pub const FILE_GROUP_TYPE: &str = "FileGroupType";
    pub const IS_DEFAULT: &str = "IsDefault";
    pub const READ_ONLY: &str = "ReadOnly";
    pub const AUTOGROW_ALL_FILES: &str = "AutogrowAllFiles";
}

/// Property names of a database bag.
pub mod database_names {
    pub const COLLATION: &str = "Collation";
    pub const CONTAINMENT_TYPE: &str = "ContainmentType";
    pub const READ_ONLY: &str = "ReadOnly";
    pub const AZURE_EDITION: &str = "AzureEdition";
    pub const AZURE_SERVICE_OBJECTIVE: &str = "AzureServiceObjective";
    pub const MAX_SIZE_IN_BYTES: &str = "MaxSizeInBytes";
}

macro_rules! tracked_delegates {
    () => {
        pub fn name(&self) -> &str {
            self.object.name()
        }

        pub fn state(&self) -> LifecycleState {
            self.object.state()
        }

        pub fn object(&self) -> &TrackedObject {
            &self.object
        }

        pub(crate) fn object_mut(&mut self) -> &mut TrackedObject {
            &mut self.object
        }

        pub fn properties(&self) -> &PropertyBag {
            self.object.properties()
        }

        pub fn properties_mut(&mut self) -> &mut PropertyBag {
            self.object.properties_mut()
        }

        pub fn set<T: PropertyType>(&mut self, name: &str, value: T) {
            self.object.set(name, value);
        }

        pub fn load<T: PropertyType>(&mut self, name: &str, value: T) {
            self.object.load(name, value);
        }

        pub fn with<T: PropertyType>(mut self, name: &str, value: T) -> Self {
            self.set(name, value);
            self
        }

        pub fn mark_for_drop(&mut self) {
            self.object.mark_for_drop();
        }
    };
}

/// A data file inside a filegroup.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    object: TrackedObject,
}

impl DataFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::new(ObjectKind::DataFile, name),
        }
    }

    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::existing(ObjectKind::DataFile, name),
        }
    }

    tracked_delegates!();
}

/// A transaction log file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogFile {
    object: TrackedObject,
}

impl LogFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::new(ObjectKind::LogFile, name),
        }
    }

    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::existing(ObjectKind::LogFile, name),
        }
    }

    tracked_delegates!();
}

/// A filegroup and the data files it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    object: TrackedObject,
    pub files: Vec<DataFile>,
}

impl FileGroup {
    pub const PRIMARY: &'static str = "PRIMARY";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::new(ObjectKind::FileGroup, name),
            files: Vec::new(),
        }
    }

    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::existing(ObjectKind::FileGroup, name),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, mut file: DataFile) -> Self {
        file.object.attach();
        self.object.attach();
        self.files.push(file);
        self
    }

    pub fn is_primary(&self) -> bool {
        self.name().eq_ignore_ascii_case(Self::PRIMARY)
    }

    tracked_delegates!();
}

/// A database with its storage layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    object: TrackedObject,
    pub filegroups: Vec<FileGroup>,
    pub log_files: Vec<LogFile>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::new(ObjectKind::Database, name),
            filegroups: Vec::new(),
            log_files: Vec::new(),
        }
    }

    pub fn existing(name: impl Into<String>) -> Self {
        Self {
            object: TrackedObject::existing(ObjectKind::Database, name),
            filegroups: Vec::new(),
            log_files: Vec::new(),
        }
    }

    pub fn with_filegroup(mut self, mut filegroup: FileGroup) -> Self {
        filegroup.object.attach();
        self.object.attach();
        self.filegroups.push(filegroup);
        self
    }

    pub fn with_log_file(mut self, mut log_file: LogFile) -> Self {
        log_file.object.attach();
        self.object.attach();
        self.log_files.push(log_file);
        self
    }

    pub fn filegroup(&self, name: &str) -> Option<&FileGroup> {
        self.filegroups.iter().find(|fg| fg.name() == name)
    }

    pub fn filegroup_mut(&mut self, name: &str) -> Option<&mut FileGroup> {
        self.filegroups.iter_mut().find(|fg| fg.name() == name)
    }

    /// The create script was applied: the database and everything
    /// defined with it become existing.
    pub fn mark_created(&mut self) -> Result<()> {
        self.object.mark_created()?;
        for filegroup in &mut self.filegroups {
            if filegroup.state().is_new() {
                filegroup.object.mark_created()?;
            }
            for file in &mut filegroup.files {
                if file.state().is_new() {
                    file.object.mark_created()?;
                }
            }
        }
        for log_file in &mut self.log_files {
            if log_file.state().is_new() {
                log_file.object.mark_created()?;
            }
        }
        Ok(())
    }

    /// The alter script was applied: new children exist, dropped ones
    /// are gone, and every pending value is committed.
    pub fn mark_altered(&mut self) -> Result<()> {
        self.object.mark_altered()?;
        self.filegroups
            .retain(|fg| fg.state() != LifecycleState::ToBeDropped);
        self.log_files
            .retain(|f| f.state() != LifecycleState::ToBeDropped);
        for filegroup in &mut self.filegroups {
            filegroup.files.retain(|f| f.state() != LifecycleState::ToBeDropped);
            settle(&mut filegroup.object)?;
            for file in &mut filegroup.files {
                settle(&mut file.object)?;
            }
        }
        for log_file in &mut self.log_files {
            settle(&mut log_file.object)?;
        }
        Ok(())
    }

    pub fn mark_dropped(&mut self) -> Result<()> {
        self.object.mark_dropped()
    }

    tracked_delegates!();
}

fn settle(object: &mut TrackedObject) -> Result<()> {
    if object.state().is_new() {
        object.mark_created()
    } else {
        object.mark_altered()
    }
}
