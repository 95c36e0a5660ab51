mod bvh_properties;
mod explode_round_trip;
mod progressive_render;
mod scene_ray_intersect;
