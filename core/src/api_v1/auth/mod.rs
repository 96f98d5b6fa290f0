//! Authentication endpoints.

pub mod register_user;

pub use register_user::{
    register_user, Gender, RegisterUserData, RegisterUserPayload, RegisterUserRequestResponse,
    RegisterUserTransformer,
};
