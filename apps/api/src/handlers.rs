pub mod audit;
pub mod health;
pub mod invitations;
pub mod permissions;
pub mod roles;
pub mod team;
