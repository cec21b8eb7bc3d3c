//! Input plumbing the hero binds against: configs, the local player's input
//! subsystem and the controller's binding table.

mod component;
mod config;
mod subsystem;

pub use component::{
    BindingHandle, InputActionValue, InputBinding, InputComponent, InputHandler, NativeInput,
    TriggerEvent,
};
pub use config::{
    InputAction, InputConfig, InputMappingContext, InputMappingContextAndPriority,
    TaggedInputAction,
};
pub use subsystem::{
    AppliedMappingContext, EnhancedInputSubsystem, InputUserSettings, LocalPlayer,
    ModifyContextOptions,
};
