mod addr;
mod layer2_rules;
mod routing_table;
mod stack_e2e;
mod tables;
