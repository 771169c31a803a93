mod auth_dto;

pub use auth_dto::{AuthUserDto, DeleteUserResponseDto, LoginDto, RegisterDto, UserProfileDto};
