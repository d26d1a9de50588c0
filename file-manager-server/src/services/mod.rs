pub mod file_manager_service;
