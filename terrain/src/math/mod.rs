mod haversine;

pub(crate) use haversine::GreatCircle;
