pub mod bundles;

pub mod documents;

pub mod match_state;

pub mod match_time;

pub mod periods;

pub mod push;

pub mod side;
