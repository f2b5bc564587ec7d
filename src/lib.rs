pub mod alarm;
pub mod appsettings;
pub mod challenge;
pub mod console;
pub mod format;
pub mod scheduling;
pub mod settings;
pub mod storage;
pub mod validation;
