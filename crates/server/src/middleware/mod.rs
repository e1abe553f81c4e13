pub mod crawler_gateway;
