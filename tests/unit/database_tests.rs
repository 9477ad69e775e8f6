//! Unit tests for database assembly

use pretty_assertions::assert_eq;
use rust_sqlddl::model::{
    database_names, file_names, filegroup_names, DataFile, Database, FileGroup, FileGroupType,
    FileGrowthType, LogFile, RecoveryModel,
};
use rust_sqlddl::{
    DatabaseScripter, DdlError, EngineType, ScriptingContext, SqlServerVersion, Termination,
};

use crate::common::{guarded, single_line};

fn ctx() -> ScriptingContext {
    single_line(SqlServerVersion::Sql160)
}

fn sales_file() -> DataFile {
    DataFile::new("Sales")
        .with(file_names::IS_PRIMARY_FILE, true)
        .with(file_names::FILE_NAME, r"C:\d\Sales.mdf".to_string())
        .with(file_names::SIZE, 8192.0_f64)
        .with(file_names::MAX_SIZE, -1.0_f64)
        .with(file_names::GROWTH, 65536.0_f64)
}

fn sales_log() -> LogFile {
    LogFile::new("Sales_log")
        .with(file_names::FILE_NAME, r"C:\d\Sales_log.ldf".to_string())
        .with(file_names::SIZE, 8192.0_f64)
}

fn new_sales() -> Database {
    Database::new("Sales")
        .with_filegroup(FileGroup::new("PRIMARY").with_file(sales_file()))
        .with_log_file(sales_log())
        .with("RecoveryModel", RecoveryModel::Simple)
}

// ============================================================================
// Create
// ============================================================================

#[test]
fn test_create_with_storage_and_options() {
    let statements = DatabaseScripter::new(&new_sales(), &ctx()).script_create().unwrap();

    assert_eq!(
        statements,
        vec![
            "USE [master]".to_string(),
            "CREATE DATABASE [Sales] ON PRIMARY \
             ( NAME = N'Sales', FILENAME = N'C:\\d\\Sales.mdf', SIZE = 8192KB, MAXSIZE = UNLIMITED, FILEGROWTH = 65536KB ) \
             LOG ON ( NAME = N'Sales_log', FILENAME = N'C:\\d\\Sales_log.ldf', SIZE = 8192KB )"
                .to_string(),
            "ALTER DATABASE [Sales] SET RECOVERY SIMPLE".to_string(),
        ]
    );
}

#[test]
fn test_create_is_guarded_when_asked() {
    let statements = DatabaseScripter::new(&new_sales(), &guarded(SqlServerVersion::Sql160))
        .script_create()
        .unwrap();
    assert!(statements[1].starts_with(
        "IF NOT EXISTS (SELECT name FROM sys.databases WHERE name = N'Sales') CREATE DATABASE [Sales]"
    ));
}

#[test]
fn test_secondary_filegroups_follow_primary() {
    let database = new_sales().with_filegroup(
        FileGroup::new("Docs")
            .with(filegroup_names::FILE_GROUP_TYPE, FileGroupType::FileStream)
            .with_file(DataFile::new("Docs1").with(file_names::FILE_NAME, r"C:\d\docs".to_string())),
    );
    let statements = DatabaseScripter::new(&database, &ctx()).script_create().unwrap();

    assert!(statements[1].contains(
        ", FILEGROUP [Docs] CONTAINS FILESTREAM ( NAME = N'Docs1', FILENAME = N'C:\\d\\docs' ) LOG ON"
    ));
}

#[test]
fn test_filestream_file_cannot_have_size() {
    let database = new_sales().with_filegroup(
        FileGroup::new("Docs")
            .with(filegroup_names::FILE_GROUP_TYPE, FileGroupType::FileStream)
            .with_file(
                DataFile::new("Docs1")
                    .with(file_names::FILE_NAME, r"C:\d\docs".to_string())
                    .with(file_names::SIZE, 1024.0_f64),
            ),
    );
    assert!(matches!(
        DatabaseScripter::new(&database, &ctx()).script_create(),
        Err(DdlError::PropertyNotSupported { .. })
    ));
}

#[test]
fn test_file_without_physical_name() {
    let database = Database::new("Sales")
        .with_filegroup(FileGroup::new("PRIMARY").with_file(DataFile::new("Sales")));
    assert!(matches!(
        DatabaseScripter::new(&database, &ctx()).script_create(),
        Err(DdlError::PropertyNotSet { .. })
    ));
}

#[test]
fn test_growth_type_none_scripts_zero() {
    let database = Database::new("Sales").with_filegroup(
        FileGroup::new("PRIMARY").with_file(
            DataFile::new("Sales")
                .with(file_names::FILE_NAME, r"C:\d\Sales.mdf".to_string())
                .with(file_names::GROWTH_TYPE, FileGrowthType::None),
        ),
    );
    let statements = DatabaseScripter::new(&database, &ctx()).script_create().unwrap();
    assert!(statements[1].ends_with("FILENAME = N'C:\\d\\Sales.mdf', FILEGROWTH = 0 )"));
}

#[test]
fn test_managed_instance_adds_files_after_create() {
    let mi = ctx().with_engine_type(EngineType::ManagedInstance);
    let statements = DatabaseScripter::new(&new_sales(), &mi).script_create().unwrap();

    assert_eq!(
        statements,
        vec![
            "USE [master]".to_string(),
            "CREATE DATABASE [Sales]".to_string(),
            "ALTER DATABASE [Sales] SET RECOVERY SIMPLE".to_string(),
            "ALTER DATABASE [Sales] ADD LOG FILE ( NAME = N'Sales_log', SIZE = 8192KB )".to_string(),
        ]
    );
}

#[test]
fn test_cloud_create_carries_service_options() {
    let cloud = ctx().with_engine_type(EngineType::CloudDatabase);
    let database = Database::new("Sales")
        .with(database_names::AZURE_EDITION, "Standard".to_string())
        .with(database_names::AZURE_SERVICE_OBJECTIVE, "S0".to_string())
        .with(database_names::MAX_SIZE_IN_BYTES, 2_i64 << 30);

    assert_eq!(
        DatabaseScripter::new(&database, &cloud).script_create().unwrap(),
        vec!["CREATE DATABASE [Sales] (EDITION = 'Standard', SERVICE_OBJECTIVE = 'S0', MAXSIZE = 2 GB)"
            .to_string()]
    );
}

// ============================================================================
// Alter
// ============================================================================

fn existing_sales() -> Database {
    let mut file = DataFile::existing("Sales");
    file.load(file_names::FILE_NAME, r"C:\d\Sales.mdf".to_string());
    file.load(file_names::SIZE, 8192.0_f64);
    let mut database =
        Database::existing("Sales").with_filegroup(FileGroup::existing("PRIMARY").with_file(file));
    database.load("RecoveryModel", RecoveryModel::Full);
    database.load(database_names::READ_ONLY, false);
    database
}

#[test]
fn test_alter_without_changes_is_empty() {
    let statements = DatabaseScripter::new(&existing_sales(), &ctx())
        .script_alter(None)
        .unwrap();
    assert!(statements.is_empty());
}

#[test]
fn test_read_only_goes_last_with_termination() {
    let mut database = existing_sales();
    database.set("RecoveryModel", RecoveryModel::Simple);
    database.set(database_names::READ_ONLY, true);

    assert_eq!(
        DatabaseScripter::new(&database, &ctx())
            .script_alter(Some(Termination::RollbackImmediate))
            .unwrap(),
        vec![
            "USE [master]".to_string(),
            "ALTER DATABASE [Sales] SET RECOVERY SIMPLE".to_string(),
            "ALTER DATABASE [Sales] SET READ_ONLY WITH ROLLBACK IMMEDIATE".to_string(),
        ]
    );
}

#[test]
fn test_becoming_writable_goes_first() {
    let mut database = existing_sales();
    database.load(database_names::READ_ONLY, true);
    database.set(database_names::READ_ONLY, false);
    database.set("RecoveryModel", RecoveryModel::Simple);

    assert_eq!(
        DatabaseScripter::new(&database, &ctx()).script_alter(None).unwrap(),
        vec![
            "USE [master]".to_string(),
            "ALTER DATABASE [Sales] SET READ_WRITE".to_string(),
            "ALTER DATABASE [Sales] SET RECOVERY SIMPLE".to_string(),
        ]
    );
}

#[test]
fn test_storage_changes_in_dependency_order() {
    let mut database = existing_sales();
    database.filegroups[0].files[0].set(file_names::SIZE, 16384.0_f64);

    let mut retired_file = DataFile::existing("F3");
    retired_file.load(file_names::FILE_NAME, r"C:\d\F3.ndf".to_string());
    let mut retired = FileGroup::existing("FG3").with_file(retired_file);
    retired.mark_for_drop();

    let mut database = database
        .with_filegroup(
            FileGroup::new("FG2")
                .with(filegroup_names::IS_DEFAULT, true)
                .with_file(
                    DataFile::new("F2")
                        .with(file_names::FILE_NAME, r"C:\d\F2.ndf".to_string())
                        .with(file_names::SIZE, 1024.0_f64),
                ),
        )
        .with_filegroup(retired);
    database.filegroups[0].set(filegroup_names::AUTOGROW_ALL_FILES, true);

    assert_eq!(
        DatabaseScripter::new(&database, &ctx()).script_alter(None).unwrap(),
        vec![
            "USE [master]".to_string(),
            "ALTER DATABASE [Sales] MODIFY FILEGROUP [PRIMARY] AUTOGROW_ALL_FILES".to_string(),
            "ALTER DATABASE [Sales] MODIFY FILE ( NAME = N'Sales', SIZE = 16384KB )".to_string(),
            "ALTER DATABASE [Sales] ADD FILEGROUP [FG2]".to_string(),
            "ALTER DATABASE [Sales] ADD FILE ( NAME = N'F2', FILENAME = N'C:\\d\\F2.ndf', SIZE = 1024KB ) \
             TO FILEGROUP [FG2]"
                .to_string(),
            "ALTER DATABASE [Sales] REMOVE FILE [F3]".to_string(),
            "ALTER DATABASE [Sales] REMOVE FILEGROUP [FG3]".to_string(),
            "USE [Sales]".to_string(),
            "ALTER DATABASE [Sales] MODIFY FILEGROUP [FG2] DEFAULT".to_string(),
        ]
    );
}

#[test]
fn test_growth_switch_to_percent() {
    let mut database = existing_sales();
    let file = &mut database.filegroups[0].files[0];
    file.load(file_names::GROWTH_TYPE, FileGrowthType::Kb);
    file.load(file_names::GROWTH, 1024.0_f64);
    file.set(file_names::GROWTH_TYPE, FileGrowthType::Percent);
    file.set(file_names::GROWTH, 10.0_f64);

    let statements = DatabaseScripter::new(&database, &ctx()).script_alter(None).unwrap();
    assert_eq!(
        statements.last().map(String::as_str),
        Some("ALTER DATABASE [Sales] MODIFY FILE ( NAME = N'Sales', FILEGROWTH = 10% )")
    );
}

#[test]
fn test_growth_rules_are_enforced() {
    let mut fractional = existing_sales();
    let file = &mut fractional.filegroups[0].files[0];
    file.set(file_names::GROWTH_TYPE, FileGrowthType::Percent);
    file.set(file_names::GROWTH, 0.5_f64);
    assert!(matches!(
        DatabaseScripter::new(&fractional, &ctx()).script_alter(None),
        Err(DdlError::WrongPropertyValue { .. })
    ));

    let mut partial_percent = existing_sales();
    let file = &mut partial_percent.filegroups[0].files[0];
    file.set(file_names::GROWTH_TYPE, FileGrowthType::Percent);
    file.set(file_names::GROWTH, 12.5_f64);
    assert!(matches!(
        DatabaseScripter::new(&partial_percent, &ctx()).script_alter(None),
        Err(DdlError::WrongPropertyValue { .. })
    ));

    let mut unit_only = existing_sales();
    let file = &mut unit_only.filegroups[0].files[0];
    file.load(file_names::GROWTH_TYPE, FileGrowthType::Kb);
    file.set(file_names::GROWTH_TYPE, FileGrowthType::Percent);
    assert!(matches!(
        DatabaseScripter::new(&unit_only, &ctx()).script_alter(None),
        Err(DdlError::PropertyNotSet { .. })
    ));
}

#[test]
fn test_alter_of_new_database_is_invalid() {
    assert!(matches!(
        DatabaseScripter::new(&new_sales(), &ctx()).script_alter(None),
        Err(DdlError::InvalidOperation { .. })
    ));
}

// ============================================================================
// Drop
// ============================================================================

#[test]
fn test_drop_forms() {
    let database = Database::existing("Sales");

    assert_eq!(
        DatabaseScripter::new(&database, &guarded(SqlServerVersion::Sql130))
            .script_drop()
            .unwrap(),
        vec!["USE [master]".to_string(), "DROP DATABASE IF EXISTS [Sales]".to_string()]
    );
    assert_eq!(
        DatabaseScripter::new(&database, &guarded(SqlServerVersion::Sql120))
            .script_drop()
            .unwrap(),
        vec![
            "USE [master]".to_string(),
            "IF EXISTS (SELECT name FROM sys.databases WHERE name = N'Sales') DROP DATABASE [Sales]"
                .to_string()
        ]
    );

    let cloud = ctx().with_engine_type(EngineType::CloudDatabase);
    assert_eq!(
        DatabaseScripter::new(&database, &cloud).script_drop().unwrap(),
        vec!["DROP DATABASE [Sales]".to_string()]
    );
}
