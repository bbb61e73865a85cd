pub mod get_files_filter_dto;
