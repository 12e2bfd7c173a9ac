pub mod async_router;
pub mod instructions;
pub mod navigation_fix;
pub mod navigation_state;
pub mod navigator;
pub mod navigator_param;
pub mod navigator_turn;
pub mod observer;
pub mod route_handle;
pub mod turn_diagram;

#[cfg(test)]
pub(crate) mod test_utils;
