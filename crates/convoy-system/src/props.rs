// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known property paths and values on participants.

/// Node holding the service-bus related participant configuration.
pub const SERVICE_BUS_NODE: &str = "service_bus";
pub const INIT_PRIORITY_PROPERTY: &str = "init_priority";
pub const START_PRIORITY_PROPERTY: &str = "start_priority";

pub const CLOCK_NODE: &str = "clock";
pub const CLOCK_SYNC_NODE: &str = "clock_synchronization";
pub const SCHEDULING_NODE: &str = "scheduling";

pub const MAIN_CLOCK_PROPERTY: &str = "clock/main_clock";
pub const TIME_FACTOR_PROPERTY: &str = "clock/time_factor";
pub const STEP_SIZE_PROPERTY: &str = "clock/step_size";
pub const TIMING_MASTER_PROPERTY: &str = "clock_synchronization/timing_master";
pub const SYNC_CYCLE_TIME_PROPERTY: &str = "clock_synchronization/sync_cycle_time";
pub const SCHEDULER_PROPERTY: &str = "scheduling/scheduler";

/// Built-in clock implementations participants ship.
pub const CLOCK_REALTIME: &str = "local_system_realtime";
pub const CLOCK_SIMTIME: &str = "local_system_simtime";
pub const CLOCK_SLAVE_ON_DEMAND: &str = "slave_master_on_demand";
pub const CLOCK_SLAVE_ON_DEMAND_DISCRETE: &str = "slave_master_on_demand_discrete";

pub const SCHEDULER_CLOCK_BASED: &str = "clock_based_scheduler";
