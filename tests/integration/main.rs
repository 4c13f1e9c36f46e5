mod custom_sink;
mod parallel_stress;
